// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Clause AST for backend search requests
//!
//! Provides a type-safe way to build the query DSL fragments that the
//! compilers emit. [`super::ElasticTranslator`] turns a [`Clause`] into the
//! JSON the backend expects.
//!
//! # Example
//!
//! ```rust
//! use search_gateway::search::{Clause, BoolClause};
//!
//! // Simple term filter
//! let draft = Clause::term("draft", false);
//!
//! // Boolean combinations
//! let visible = BoolClause::new()
//!     .filter(Clause::term("draft", false))
//!     .filter(Clause::term("isFuture", false))
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

/// Query DSL node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    /// Matches every document
    MatchAll,
    /// Exact value on a keyword/boolean/numeric field
    Term {
        field: String,
        value: TermValue,
        case_insensitive: bool,
    },
    /// Field has any value
    Exists { field: String },
    /// Numeric range
    Range(RangeQuery),
    /// Keyword prefix (used on `_index`)
    Prefix { field: String, value: String },
    /// Match across several fields
    MultiMatch(MultiMatch),
    /// Phrase match where the last term is a prefix (type-ahead)
    MatchPhrasePrefix {
        field: String,
        query: String,
        boost: Option<f64>,
    },
    /// All terms must match an `.exact` sub-field with no fuzziness
    ExactMatch { field: String, query: String },
    /// Boolean composition
    Bool(BoolClause),
}

impl Clause {
    /// Create a term clause: `{"term": {field: value}}`
    pub fn term(field: impl Into<String>, value: impl Into<TermValue>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
            case_insensitive: false,
        }
    }

    /// Create a case-insensitive term clause
    pub fn term_ci(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: TermValue::Text(value.into()),
            case_insensitive: true,
        }
    }

    /// Create an exists clause
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists { field: field.into() }
    }

    /// Create a single-bound range clause
    pub fn range(field: impl Into<String>, op: RangeOp, value: f64) -> Self {
        let mut range = RangeQuery {
            field: field.into(),
            ..RangeQuery::default()
        };
        match op {
            RangeOp::Gt => range.gt = Some(value),
            RangeOp::Gte => range.gte = Some(value),
            RangeOp::Lt => range.lt = Some(value),
            RangeOp::Lte => range.lte = Some(value),
            RangeOp::Eq => {
                range.gte = Some(value);
                range.lte = Some(value);
            }
        }
        Self::Range(range)
    }

    /// Create a prefix clause
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a phrase-prefix clause
    pub fn phrase_prefix(field: impl Into<String>, query: impl Into<String>, boost: Option<f64>) -> Self {
        Self::MatchPhrasePrefix {
            field: field.into(),
            query: query.into(),
            boost,
        }
    }

    /// Wrap in a `must_not`
    pub fn negate(self) -> Self {
        BoolClause::new().must_not(self).build()
    }

    /// OR the given clauses together; a single clause is returned as-is
    pub fn any_of(mut clauses: Vec<Clause>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Self::Bool(BoolClause {
                should: clauses,
                ..BoolClause::default()
            })
        }
    }
}

/// Term value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for TermValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for TermValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for TermValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for TermValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TermValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

/// Range bounds on one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

/// Fuzzy edit distance allowed on a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fuzziness {
    /// Backend picks distance from term length
    Auto,
    /// Fixed Levenshtein distance
    Edits(u8),
}

impl Default for Fuzziness {
    fn default() -> Self {
        Self::Edits(1)
    }
}

/// How a multi-field match scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultiMatchKind {
    #[default]
    BestFields,
    Phrase,
}

/// Multi-field match
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiMatch {
    pub query: String,
    /// Field names, optionally boosted (`title^3`)
    pub fields: Vec<String>,
    pub kind: MultiMatchKind,
    pub fuzziness: Option<Fuzziness>,
    pub max_expansions: Option<u32>,
    pub prefix_length: Option<u32>,
    pub minimum_should_match: Option<String>,
    /// `true` for OR semantics between terms
    pub operator_or: bool,
    pub slop: Option<u32>,
    pub boost: Option<f64>,
}

impl MultiMatch {
    pub fn new(query: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            query: query.into(),
            fields,
            ..Self::default()
        }
    }

    pub fn phrase(mut self, slop: Option<u32>) -> Self {
        self.kind = MultiMatchKind::Phrase;
        self.slop = slop;
        self
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn build(self) -> Clause {
        Clause::MultiMatch(self)
    }
}

/// Boolean clause, also used as a builder
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoolClause {
    pub must: Vec<Clause>,
    pub must_not: Vec<Clause>,
    pub should: Vec<Clause>,
    pub filter: Vec<Clause>,
}

impl BoolClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, clause: Clause) -> Self {
        self.must.push(clause);
        self
    }

    pub fn must_not(mut self, clause: Clause) -> Self {
        self.must_not.push(clause);
        self
    }

    pub fn should(mut self, clause: Clause) -> Self {
        self.should.push(clause);
        self
    }

    pub fn filter(mut self, clause: Clause) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn filters(mut self, clauses: impl IntoIterator<Item = Clause>) -> Self {
        self.filter.extend(clauses);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty() && self.filter.is_empty()
    }

    pub fn build(self) -> Clause {
        Clause::Bool(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_from_bool() {
        let clause = Clause::term("draft", false);
        assert_eq!(
            clause,
            Clause::Term {
                field: "draft".to_string(),
                value: TermValue::Bool(false),
                case_insensitive: false,
            }
        );
    }

    #[test]
    fn test_range_eq_sets_both_bounds() {
        match Clause::range("baseScore", RangeOp::Eq, 5.0) {
            Clause::Range(range) => {
                assert_eq!(range.gte, Some(5.0));
                assert_eq!(range.lte, Some(5.0));
                assert_eq!(range.gt, None);
                assert_eq!(range.lt, None);
            }
            _ => panic!("Expected Range clause"),
        }
    }

    #[test]
    fn test_negate_wraps_must_not() {
        match Clause::term("spam", true).negate() {
            Clause::Bool(b) => {
                assert_eq!(b.must_not.len(), 1);
                assert!(b.must.is_empty());
            }
            _ => panic!("Expected Bool clause"),
        }
    }

    #[test]
    fn test_any_of_single_is_unwrapped() {
        let clause = Clause::any_of(vec![Clause::exists("x")]);
        assert_eq!(clause, Clause::exists("x"));
    }

    #[test]
    fn test_any_of_many_is_should() {
        match Clause::any_of(vec![Clause::exists("x"), Clause::exists("y")]) {
            Clause::Bool(b) => assert_eq!(b.should.len(), 2),
            _ => panic!("Expected Bool clause"),
        }
    }

    #[test]
    fn test_bool_builder() {
        let b = BoolClause::new()
            .must(Clause::MatchAll)
            .filter(Clause::term("a", 1i64))
            .filter(Clause::term("b", "x"));
        assert!(!b.is_empty());
        assert_eq!(b.filter.len(), 2);
        assert!(BoolClause::new().is_empty());
    }
}
