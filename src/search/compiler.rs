// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Single-collection query compiler
//!
//! Pure function from a [`QueryData`] and its [`IndexConfig`] to a
//! [`CompiledQuery`].
//!
//! # Matching query
//!
//! ```text
//! ""                  match_all
//! plain words         should: [objectID term, fuzzy match, phrase^2, phrase_prefix^20]
//! advanced syntax     must:     phrase on field.exact   (per "quoted" token)
//!                     must_not: plain match             (per -negated token)
//!                     should:   fuzzy match             (per plain token)
//! ```
//!
//! Advanced queries also carry a highlight-only query (fuzzy match over the
//! untokenized search string) since nested bool queries break highlighting.

use thiserror::Error;
use tracing::debug;

use crate::registry::{exact_field, IndexConfig, IndexRegistry};
use crate::error::SearchError;

use super::query_builder::{BoolClause, Clause, MultiMatch, TermValue};
use super::ranking::compile_score;
use super::tokenizer::{parse_query, QueryToken, TokenKind};
use super::types::{
    CompileOptions, CompiledQuery, FacetValue, HighlightField, HighlightSpec, QueryData, QueryFilter, SortKey,
    SortOrder,
};

/// Identifier field matched exactly by simple queries
pub const OBJECT_ID_FIELD: &str = "objectID";
/// Canonical date used by `newest_first` / `oldest_first`
pub const DATE_SORT_FIELD: &str = "publicDateMs";
/// Internal bookkeeping field never returned to callers
pub const EXPORTED_AT_FIELD: &str = "exportedAt";

pub const DEFAULT_PRE_TAG: &str = "<em>";
pub const DEFAULT_POST_TAG: &str = "</em>";
pub const FRAGMENT_SIZE: usize = 140;

const MAX_EXPANSIONS: u32 = 10;
const PREFIX_LENGTH: u32 = 3;
const MINIMUM_SHOULD_MATCH: &str = "50%";
const PHRASE_SLOP: u32 = 2;
const PHRASE_BOOST: f64 = 2.0;
const PREFIX_BOOST: f64 = 20.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Invalid sorting: {0}")]
    InvalidSorting(String),
    #[error("Invalid sorting order: {0}")]
    InvalidSortOrder(String),
    #[error("Index cannot be sorted by location: {collection}")]
    LocationNotSupported { collection: String },
}

struct MatchingQuery {
    tokens: Vec<QueryToken>,
    query: Clause,
    highlight_query: Option<Clause>,
}

/// Fuzzy OR-match across `fields` requiring half the terms
pub fn default_match(search: &str, fields: &[String], opts: &CompileOptions) -> Clause {
    MultiMatch {
        fuzziness: Some(opts.fuzziness),
        max_expansions: Some(MAX_EXPANSIONS),
        prefix_length: Some(PREFIX_LENGTH),
        minimum_should_match: Some(MINIMUM_SHOULD_MATCH.to_string()),
        operator_or: true,
        ..MultiMatch::new(search, fields.to_vec())
    }
    .build()
}

fn simple_query(search: &str, config: &IndexConfig, opts: &CompileOptions) -> Clause {
    let mut should = vec![
        Clause::term(OBJECT_ID_FIELD, search),
        default_match(search, &config.fields, opts),
        MultiMatch::new(search, config.fields.clone())
            .phrase(Some(PHRASE_SLOP))
            .boost(PHRASE_BOOST)
            .build(),
    ];
    if let Some(primary) = config.fields.first() {
        should.push(Clause::phrase_prefix(
            exact_field(primary, false),
            search,
            Some(PREFIX_BOOST),
        ));
    }
    Clause::Bool(BoolClause {
        should,
        ..BoolClause::default()
    })
}

fn advanced_query(tokens: &[QueryToken], config: &IndexConfig, opts: &CompileOptions) -> Clause {
    let exact_fields: Vec<String> = config.fields.iter().map(|f| exact_field(f, true)).collect();
    let mut query = BoolClause::new();
    for token in tokens {
        match token.kind {
            TokenKind::Must => {
                query = query.must(MultiMatch::new(&token.text, exact_fields.clone()).phrase(None).build());
            }
            TokenKind::Not => {
                query = query.must_not(MultiMatch::new(&token.text, config.fields.clone()).build());
            }
            TokenKind::Should => {
                query = query.should(default_match(&token.text, &config.fields, opts));
            }
            // Compiled into filters
            TokenKind::User | TokenKind::Tag => {}
        }
    }
    query.build()
}

fn compile_matching(data: &QueryData, config: &IndexConfig, opts: &CompileOptions) -> MatchingQuery {
    let search = data.search.trim();
    if search.is_empty() {
        return MatchingQuery {
            tokens: Vec::new(),
            query: Clause::MatchAll,
            highlight_query: None,
        };
    }

    let parsed = parse_query(search, &opts.tag_namespace);
    if parsed.is_advanced {
        MatchingQuery {
            query: advanced_query(&parsed.tokens, config, opts),
            highlight_query: Some(default_match(search, &config.fields, opts)),
            tokens: parsed.tokens,
        }
    } else {
        MatchingQuery {
            query: simple_query(search, config, opts),
            highlight_query: None,
            tokens: parsed.tokens,
        }
    }
}

fn facet_term_value(value: &FacetValue) -> TermValue {
    match value {
        FacetValue::Bool(b) => TermValue::Bool(*b),
        FacetValue::Text(s) => TermValue::Text(s.clone()),
    }
}

fn compile_facet(field: &str, value: Option<&FacetValue>, negated: bool, config: &IndexConfig) -> Clause {
    // null facet: "field is missing", or "field exists" when negated
    let Some(value) = value else {
        let exists = Clause::exists(field);
        return if negated { exists } else { exists.negate() };
    };

    let term = if config.is_full_text_field(field) {
        let query = match value {
            FacetValue::Bool(b) => b.to_string(),
            FacetValue::Text(s) => s.clone(),
        };
        Clause::ExactMatch {
            field: format!("{}.exact", field),
            query,
        }
    } else {
        Clause::term(field, facet_term_value(value))
    };

    if negated {
        term.negate()
    } else {
        term
    }
}

fn compile_filter(filter: &QueryFilter, config: &IndexConfig) -> Clause {
    match filter {
        QueryFilter::Facet { field, value, negated } => compile_facet(field, value.as_ref(), *negated, config),
        QueryFilter::Numeric { field, value, op } => Clause::range(field, *op, *value),
        QueryFilter::Exists { field } => Clause::exists(field),
    }
}

/// Always-on filters, then dynamic filters OR-ed per field (first-seen field
/// order), then user/tag token filters.
pub fn compile_filters(filters: &[QueryFilter], tokens: &[QueryToken], config: &IndexConfig) -> Vec<Clause> {
    let mut clauses = config.filters.clone();

    let mut by_field: Vec<(&str, Vec<Clause>)> = Vec::new();
    for filter in filters {
        let clause = compile_filter(filter, config);
        match by_field.iter_mut().find(|(field, _)| *field == filter.field()) {
            Some((_, group)) => group.push(clause),
            None => by_field.push((filter.field(), vec![clause])),
        }
    }
    clauses.extend(by_field.into_iter().map(|(_, group)| Clause::any_of(group)));

    let mut users = Vec::new();
    let mut tags = Vec::new();
    for token in tokens {
        let text = token.text.as_str();
        match token.kind {
            TokenKind::User => users.extend([
                Clause::term("authorSlug.sort", text),
                Clause::term("authorDisplayName.sort", text),
                Clause::term("userId", text),
            ]),
            TokenKind::Tag => tags.extend([
                Clause::term("tags._id", text),
                Clause::term_ci("tags.slug", text),
                Clause::term_ci("tags.name", text),
            ]),
            _ => {}
        }
    }
    for group in [users, tags] {
        if !group.is_empty() {
            clauses.push(Clause::Bool(BoolClause {
                should: group,
                ..BoolClause::default()
            }));
        }
    }

    clauses
}

/// Sort keys for a sorting keyword (or `field:order`) and optional coordinates
pub fn compile_sort(
    sorting: Option<&str>,
    coordinates: Option<[f64; 2]>,
    config: &IndexConfig,
) -> Result<Vec<SortKey>, CompileError> {
    let tiebreaker = SortKey::field(&config.tiebreaker, SortOrder::Desc);

    if let Some(coordinates) = coordinates {
        let field = config
            .location_field
            .as_ref()
            .ok_or_else(|| CompileError::LocationNotSupported {
                collection: config.collection.clone(),
            })?;
        return Ok(vec![
            SortKey::GeoDistance {
                field: field.clone(),
                coordinates,
                order: SortOrder::Asc,
            },
            tiebreaker,
        ]);
    }

    let sorting = sorting.unwrap_or_default();

    // Custom sort ignores relevance entirely
    if let Some((field, order)) = sorting.split_once(':').filter(|(field, _)| !field.is_empty()) {
        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => return Err(CompileError::InvalidSortOrder(other.to_string())),
        };
        return Ok(vec![SortKey::field(field, order), tiebreaker]);
    }

    let mut sort = vec![SortKey::Score(SortOrder::Desc), tiebreaker];
    match sorting {
        "" | "relevance" => {}
        "karma" => sort.insert(0, SortKey::field(config.karma_field_or_default(), SortOrder::Desc)),
        "newest_first" => sort.insert(0, SortKey::field(DATE_SORT_FIELD, SortOrder::Desc)),
        "oldest_first" => sort.insert(0, SortKey::field(DATE_SORT_FIELD, SortOrder::Asc)),
        other => return Err(CompileError::InvalidSorting(other.to_string())),
    }
    Ok(sort)
}

fn compile_highlight(data: &QueryData, config: &IndexConfig, query: Option<Clause>) -> HighlightSpec {
    let mut fields = vec![HighlightField {
        name: config.snippet.clone(),
        query: query.clone(),
    }];
    if let Some(highlight) = config.highlight.as_ref().filter(|h| **h != config.snippet) {
        fields.push(HighlightField {
            name: highlight.clone(),
            query,
        });
    }
    HighlightSpec {
        pre_tag: data.pre_tag.clone().unwrap_or_else(|| DEFAULT_PRE_TAG.to_string()),
        post_tag: data.post_tag.clone().unwrap_or_else(|| DEFAULT_POST_TAG.to_string()),
        fields,
        fragment_size: FRAGMENT_SIZE,
        no_match_size: FRAGMENT_SIZE,
    }
}

/// Fields stripped from `_source`: the export stamp plus the config's private fields
pub fn source_excludes<'a>(private_fields: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut excludes = vec![EXPORTED_AT_FIELD.to_string()];
    for field in private_fields {
        if !excludes.contains(field) {
            excludes.push(field.clone());
        }
    }
    excludes
}

/// Compile one search request against its collection config
pub fn compile_query(
    data: &QueryData,
    config: &IndexConfig,
    opts: &CompileOptions,
) -> Result<CompiledQuery, CompileError> {
    let sort = compile_sort(data.sorting.as_deref(), data.coordinates, config)?;
    let matching = compile_matching(data, config, opts);
    let filters = compile_filters(&data.filters, &matching.tokens, config);

    // Elastic rejects custom highlighting combined with distance sorting
    let highlight = match data.coordinates {
        Some(_) => None,
        None => Some(compile_highlight(data, config, matching.highlight_query)),
    };

    debug!(
        index = %data.index,
        tokens = matching.tokens.len(),
        filters = filters.len(),
        "Compiled search query"
    );

    Ok(CompiledQuery {
        index: data.index.clone(),
        from: data.offset,
        size: data.limit,
        tokens: matching.tokens,
        query: matching.query,
        filters,
        script: compile_score(&config.ranking, opts),
        sort,
        highlight,
        source_excludes: source_excludes(&config.private_fields),
        snippet_field: config.snippet.clone(),
        highlight_field: config.highlight.clone(),
    })
}

/// Resolve `data.index` through the registry, then compile
pub fn compile_for_index(
    data: &QueryData,
    registry: &IndexRegistry,
    opts: &CompileOptions,
) -> Result<CompiledQuery, SearchError> {
    let config = registry.config_for_index(&data.index)?;
    Ok(compile_query(data, config, opts)?)
}
