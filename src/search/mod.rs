// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Compilation
//!
//! Turns a free-text search plus collection config into an Elasticsearch
//! request body. Everything here is pure and synchronous.
//!
//! # Architecture
//!
//! ```text
//! search string
//!     ↓
//! parse_query ──→ tokens, is_advanced
//!     ↓
//! compile_query (IndexConfig, Ranking → ScoreExpr)
//!     ↓
//! CompiledQuery (Clause AST)
//!     ↓
//! ElasticTranslator ──→ {"query": {"script_score": ...}, "sort": ..., "highlight": ...}
//! ```
//!
//! # Advanced Syntax
//!
//! ```text
//! "exact phrase"    - Must match (exact sub-fields)
//! -word             - Must not match
//! user:slug         - Author filter
//! tag:slug          - Tag filter
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use search_gateway::registry::IndexRegistry;
//! use search_gateway::search::{compile_query, CompileOptions, ElasticTranslator, QueryData};
//!
//! let registry = IndexRegistry::standard();
//! let config = registry.config("Posts").unwrap();
//! let opts = CompileOptions::new(Utc::now(), "2014-06-01T00:00:00Z".parse().unwrap());
//!
//! let compiled = compile_query(&QueryData::new("posts", "hello world"), config, &opts).unwrap();
//! let body = ElasticTranslator::request_body(&compiled);
//! assert!(body["query"]["script_score"].is_object());
//! ```

mod compiler;
mod elastic_translator;
mod multi;
mod query_builder;
mod ranking;
mod tokenizer;
mod types;

pub use compiler::{
    compile_filters, compile_for_index, compile_query, compile_sort, default_match, source_excludes, CompileError,
    DATE_SORT_FIELD, DEFAULT_POST_TAG, DEFAULT_PRE_TAG, EXPORTED_AT_FIELD, FRAGMENT_SIZE, OBJECT_ID_FIELD,
};
pub use elastic_translator::{ElasticTranslator, EXACT_ANALYZER};
pub use multi::{compile_multi_query, resolve_index, INDEX_FIELD};
pub use query_builder::{BoolClause, Clause, Fuzziness, MultiMatch, MultiMatchKind, RangeOp, RangeQuery, TermValue};
pub use ranking::{compile_ranking, compile_score, day_range, Ranking, ScoreExpr, Scoring};
pub use tokenizer::{normalize_token, parse_query, ParsedQuery, QueryToken, TokenKind};
pub use types::{
    CompileOptions, CompiledMultiQuery, CompiledQuery, FacetValue, HighlightField, HighlightSpec, MultiQueryData,
    QueryData, QueryFilter, SortKey, SortOrder, DEFAULT_LIMIT,
};
