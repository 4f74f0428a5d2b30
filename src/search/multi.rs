//! Multi-collection query compiler
//!
//! Type-ahead search over several collections in one request. Each collection
//! contributes one `should` branch:
//!
//! ```text
//! bool
//!   must:   match_phrase_prefix(primary field, search)   | match_all if empty
//!   filter: prefix(_index, index), ...always-on filters
//! ```
//!
//! The `_index` prefix keeps one collection's filters from admitting another
//! collection's documents. When one requested index name is a prefix of
//! another (`posts`, `postsarchive`), the shorter branch also excludes the
//! longer prefix. No ranking script is applied.

use tracing::debug;

use crate::registry::{ConfigError, IndexRegistry};

use super::compiler::source_excludes;
use super::query_builder::{BoolClause, Clause};
use super::types::{CompiledMultiQuery, MultiQueryData};

/// Backend metadata field holding a hit's index name
pub const INDEX_FIELD: &str = "_index";

/// Compile a multi-collection query. At least one index is required and
/// every index must be registered.
pub fn compile_multi_query(
    data: &MultiQueryData,
    registry: &IndexRegistry,
) -> Result<CompiledMultiQuery, ConfigError> {
    if data.indexes.is_empty() {
        return Err(ConfigError::NoIndexes);
    }
    let search = data.search.trim();
    let mut branches = Vec::with_capacity(data.indexes.len());
    let mut private_fields = Vec::new();

    for index in &data.indexes {
        let config = registry.config_for_index(index)?;
        let matching = match config.primary_field() {
            Some(field) if !search.is_empty() => Clause::phrase_prefix(field, search, None),
            _ => Clause::MatchAll,
        };
        let mut branch = BoolClause::new()
            .must(matching)
            .filter(Clause::prefix(INDEX_FIELD, index.as_str()))
            .filters(config.filters.iter().cloned());
        for other in longer_prefixed(&data.indexes, index) {
            branch = branch.must_not(Clause::prefix(INDEX_FIELD, other));
        }
        branches.push(branch.build());
        private_fields.extend(config.private_fields.iter());
    }

    debug!(indexes = data.indexes.len(), "Compiled multi-collection query");

    Ok(CompiledMultiQuery {
        indexes: data.indexes.clone(),
        from: data.offset,
        size: data.limit,
        query: Clause::Bool(BoolClause {
            should: branches,
            ..BoolClause::default()
        }),
        source_excludes: source_excludes(private_fields),
    })
}

/// Requested indexes that extend `index` (`postsarchive` for `posts`)
fn longer_prefixed<'a>(indexes: &'a [String], index: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    indexes
        .iter()
        .map(String::as_str)
        .filter(move |other| other.len() > index.len() && other.starts_with(index))
}

/// Map a concrete backend index name back to the requested index it belongs
/// to. Concrete names may carry a suffix behind an alias; the longest
/// matching prefix wins.
pub fn resolve_index<'a>(indexes: &'a [String], concrete: &str) -> Option<&'a str> {
    indexes
        .iter()
        .map(String::as_str)
        .filter(|index| concrete.starts_with(index))
        .max_by_key(|index| index.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IndexConfig;
    use crate::search::ElasticTranslator;

    fn data(indexes: &[&str], search: &str) -> MultiQueryData {
        MultiQueryData {
            indexes: indexes.iter().map(|s| s.to_string()).collect(),
            search: search.into(),
            offset: 0,
            limit: 5,
        }
    }

    #[test]
    fn test_one_branch_per_index() {
        let registry = IndexRegistry::standard();
        let compiled = compile_multi_query(&data(&["posts", "tags"], "ratio"), &registry).unwrap();
        let Clause::Bool(query) = &compiled.query else {
            panic!("Expected bool query");
        };
        assert_eq!(query.should.len(), 2);

        let Clause::Bool(posts) = &query.should[0] else {
            panic!("Expected bool branch");
        };
        assert_eq!(posts.must, vec![Clause::phrase_prefix("title", "ratio", None)]);
        assert_eq!(posts.filter[0], Clause::prefix("_index", "posts"));
        let posts_config = registry.config("Posts").unwrap();
        assert_eq!(posts.filter.len(), 1 + posts_config.filters.len());

        let Clause::Bool(tags) = &query.should[1] else {
            panic!("Expected bool branch");
        };
        assert_eq!(tags.must, vec![Clause::phrase_prefix("name", "ratio", None)]);
    }

    #[test]
    fn test_private_fields_are_aggregated() {
        let registry = IndexRegistry::standard();
        let compiled = compile_multi_query(&data(&["posts", "tags"], "x"), &registry).unwrap();
        assert_eq!(compiled.source_excludes[0], "exportedAt");
        for field in ["draft", "unlisted", "adminOnly"] {
            assert!(compiled.source_excludes.contains(&field.to_string()), "missing {}", field);
        }
        // Shared names appear once
        let deleted = compiled.source_excludes.iter().filter(|f| *f == "deleted").count();
        assert_eq!(deleted, 1);
    }

    #[test]
    fn test_empty_search_matches_all_per_index() {
        let registry = IndexRegistry::standard();
        let compiled = compile_multi_query(&data(&["comments"], ""), &registry).unwrap();
        let body = ElasticTranslator::multi_request_body(&compiled);
        assert_eq!(
            body["query"]["bool"]["should"][0]["bool"]["must"][0],
            serde_json::json!({"match_all": {}})
        );
        assert!(body.get("highlight").is_none());
        assert_eq!(body["size"], 5);
    }

    #[test]
    fn test_empty_index_list_is_rejected() {
        let registry = IndexRegistry::standard();
        let err = compile_multi_query(&data(&[], "x"), &registry).unwrap_err();
        assert_eq!(err, ConfigError::NoIndexes);
    }

    fn overlapping_registry() -> IndexRegistry {
        IndexRegistry::from_configs([
            IndexConfig::new("Posts").index("posts").field("title"),
            IndexConfig::new("PostsArchive").index("postsarchive").field("title"),
        ])
        .unwrap()
    }

    #[test]
    fn test_overlapping_index_names_stay_separate() {
        let registry = overlapping_registry();
        let compiled = compile_multi_query(&data(&["posts", "postsarchive"], "x"), &registry).unwrap();
        let Clause::Bool(query) = &compiled.query else {
            panic!("Expected bool query");
        };

        let Clause::Bool(posts) = &query.should[0] else {
            panic!("Expected bool branch");
        };
        assert_eq!(posts.filter[0], Clause::prefix("_index", "posts"));
        assert_eq!(posts.must_not, vec![Clause::prefix("_index", "postsarchive")]);

        let Clause::Bool(archive) = &query.should[1] else {
            panic!("Expected bool branch");
        };
        assert_eq!(archive.filter[0], Clause::prefix("_index", "postsarchive"));
        assert!(archive.must_not.is_empty());
    }

    #[test]
    fn test_resolve_index_prefers_longest_prefix() {
        let indexes = vec!["posts".to_string(), "postsarchive".to_string()];
        assert_eq!(resolve_index(&indexes, "postsarchive_2024"), Some("postsarchive"));
        assert_eq!(resolve_index(&indexes, "posts_2024"), Some("posts"));
        assert_eq!(resolve_index(&indexes, "posts"), Some("posts"));
        assert_eq!(resolve_index(&indexes, "tags"), None);

        // Order of the request does not matter
        let reversed = vec!["postsarchive".to_string(), "posts".to_string()];
        assert_eq!(resolve_index(&reversed, "postsarchive_2024"), Some("postsarchive"));
    }

    #[test]
    fn test_unknown_index_fails() {
        let registry = IndexRegistry::standard();
        let err = compile_multi_query(&data(&["posts", "nope"], "x"), &registry).unwrap_err();
        assert_eq!(err, ConfigError::ConfigNotFound { name: "nope".into() });
    }
}
