//! Search-string tokenizer
//!
//! Splits a raw search string into typed tokens and detects the "advanced"
//! syntax (quotes, negation, field prefixes).
//!
//! # Grammar
//!
//! ```text
//! token  := prefix? body
//! prefix := "-" | word ":"
//! body   := '"' [^"]* '"' | "'" [^']* "'" | non-whitespace+
//! ```
//!
//! | Input         | Token            |
//! |---------------|------------------|
//! | `word`        | should `word`    |
//! | `"a phrase"`  | must `a phrase`  |
//! | `-word`       | not `word`       |
//! | `user:slug`   | user `slug`      |
//! | `tag:slug`    | tag `slug`       |
//!
//! An unterminated quote never matches the quoted form: `"foo bar` yields the
//! plain words `foo` and `bar`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Should,
    Must,
    Not,
    User,
    Tag,
}

/// One parsed token, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryToken {
    pub kind: TokenKind,
    pub text: String,
}

impl QueryToken {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Tokenizer output
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedQuery {
    pub tokens: Vec<QueryToken>,
    /// True iff any token is not `should`
    pub is_advanced: bool,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?P<prefix>-|\w+:)?(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<word>\S+))"#)
            .expect("token regex is valid")
    })
}

fn strip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("strip regex is valid"))
}

/// Replace `-`/`_` with spaces and drop everything else that is not a word
/// character or whitespace.
pub fn normalize_token(text: &str) -> String {
    let spaced = text.replace(['-', '_'], " ");
    let stripped = strip_regex().replace_all(&spaced, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenize a search string. `tag_namespace` is the prefix word (without the
/// colon) that marks tag tokens.
pub fn parse_query(query: &str, tag_namespace: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    for caps in token_regex().captures_iter(query) {
        let prefix = caps.name("prefix").map(|m| m.as_str());
        let quoted = caps.name("dq").or_else(|| caps.name("sq")).map(|m| m.as_str());
        let body = quoted.or_else(|| caps.name("word").map(|m| m.as_str())).unwrap_or("");

        let (kind, raw) = match prefix {
            Some("-") => (TokenKind::Not, body.to_string()),
            Some(p) if p.trim_end_matches(':') == "user" => (TokenKind::User, body.to_string()),
            Some(p) if p.trim_end_matches(':') == tag_namespace => (TokenKind::Tag, body.to_string()),
            // Unrecognised `word:` prefixes stay part of the text
            Some(p) => {
                let kind = if quoted.is_some() { TokenKind::Must } else { TokenKind::Should };
                (kind, format!("{p}{body}"))
            }
            None if quoted.is_some() => (TokenKind::Must, body.to_string()),
            None => (TokenKind::Should, body.to_string()),
        };

        let text = match kind {
            TokenKind::User | TokenKind::Tag => raw.trim().to_string(),
            _ => normalize_token(&raw),
        };
        if text.is_empty() {
            continue;
        }

        parsed.is_advanced |= kind != TokenKind::Should;
        parsed.tokens.push(QueryToken { kind, text });
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> ParsedQuery {
        parse_query(query, "tag")
    }

    #[test]
    fn test_plain_words() {
        let parsed = parse("a test query");
        assert_eq!(
            parsed.tokens,
            vec![
                QueryToken::new(TokenKind::Should, "a"),
                QueryToken::new(TokenKind::Should, "test"),
                QueryToken::new(TokenKind::Should, "query"),
            ]
        );
        assert!(!parsed.is_advanced);
    }

    #[test]
    fn test_double_quoted_is_must() {
        let parsed = parse(r#"a test "query""#);
        assert_eq!(parsed.tokens.last(), Some(&QueryToken::new(TokenKind::Must, "query")));
        assert!(parsed.is_advanced);
    }

    #[test]
    fn test_single_quoted_phrase() {
        let parsed = parse("'hello world' again");
        assert_eq!(parsed.tokens[0], QueryToken::new(TokenKind::Must, "hello world"));
        assert_eq!(parsed.tokens[1], QueryToken::new(TokenKind::Should, "again"));
        assert!(parsed.is_advanced);
    }

    #[test]
    fn test_negation() {
        let parsed = parse("a test -query");
        assert_eq!(parsed.tokens.last(), Some(&QueryToken::new(TokenKind::Not, "query")));
        assert!(parsed.is_advanced);
    }

    #[test]
    fn test_user_and_tag_prefixes() {
        let parsed = parse("alignment user:some-author tag:ai");
        assert_eq!(parsed.tokens[1], QueryToken::new(TokenKind::User, "some-author"));
        assert_eq!(parsed.tokens[2], QueryToken::new(TokenKind::Tag, "ai"));
        assert!(parsed.is_advanced);
    }

    #[test]
    fn test_custom_tag_namespace() {
        let parsed = parse_query("topic:rationality tag:ai", "topic");
        assert_eq!(parsed.tokens[0], QueryToken::new(TokenKind::Tag, "rationality"));
        // "tag:" is now an ordinary word
        assert_eq!(parsed.tokens[1], QueryToken::new(TokenKind::Should, "tagai"));
    }

    #[test]
    fn test_quoted_user_keeps_spaces() {
        let parsed = parse(r#"user:"Jane Doe""#);
        assert_eq!(parsed.tokens, vec![QueryToken::new(TokenKind::User, "Jane Doe")]);
    }

    #[test]
    fn test_normalization_of_separators() {
        let parsed = parse("well-known snake_case it's");
        assert_eq!(parsed.tokens[0].text, "well known");
        assert_eq!(parsed.tokens[1].text, "snake case");
        assert_eq!(parsed.tokens[2].text, "its");
        assert!(!parsed.is_advanced);
    }

    #[test]
    fn test_unterminated_double_quote_falls_back_to_words() {
        let parsed = parse(r#"foo "bar baz"#);
        assert_eq!(
            parsed.tokens,
            vec![
                QueryToken::new(TokenKind::Should, "foo"),
                QueryToken::new(TokenKind::Should, "bar"),
                QueryToken::new(TokenKind::Should, "baz"),
            ]
        );
        assert!(!parsed.is_advanced);
    }

    #[test]
    fn test_unterminated_single_quote_falls_back_to_words() {
        let parsed = parse("it 'never ends");
        assert_eq!(parsed.tokens[1], QueryToken::new(TokenKind::Should, "never"));
        assert!(!parsed.is_advanced);
    }

    #[test]
    fn test_negated_unterminated_quote() {
        let parsed = parse(r#"-"open ended"#);
        assert_eq!(parsed.tokens[0], QueryToken::new(TokenKind::Not, "open"));
        assert_eq!(parsed.tokens[1], QueryToken::new(TokenKind::Should, "ended"));
        assert!(parsed.is_advanced);
    }

    #[test]
    fn test_lone_punctuation_is_dropped() {
        let parsed = parse("- ! hello");
        assert_eq!(parsed.tokens, vec![QueryToken::new(TokenKind::Should, "hello")]);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("   ");
        assert!(parsed.tokens.is_empty());
        assert!(!parsed.is_advanced);
    }

    #[test]
    fn test_unknown_prefix_stays_in_text() {
        let parsed = parse("foo:bar");
        assert_eq!(parsed.tokens, vec![QueryToken::new(TokenKind::Should, "foobar")]);
    }
}
