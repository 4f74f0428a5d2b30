//! Request and compiled-request types for the query compilers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

use super::query_builder::{Clause, Fuzziness, RangeOp};
use super::ranking::ScoreExpr;
use super::tokenizer::QueryToken;

/// Default page size when the caller gives none.
pub const DEFAULT_LIMIT: usize = 10;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Facet value; `null` on the wire means "field is missing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    Bool(bool),
    Text(String),
}

/// Dynamic filter supplied with a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryFilter {
    Facet {
        field: String,
        value: Option<FacetValue>,
        #[serde(default)]
        negated: bool,
    },
    Numeric {
        field: String,
        value: f64,
        op: RangeOp,
    },
    Exists {
        field: String,
    },
}

impl QueryFilter {
    pub fn field(&self) -> &str {
        match self {
            Self::Facet { field, .. } | Self::Numeric { field, .. } | Self::Exists { field } => field,
        }
    }
}

/// One single-collection search request, already in offset/limit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    /// Physical index name (e.g. `posts`)
    pub index: String,
    pub search: String,
    #[serde(default)]
    pub sorting: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub pre_tag: Option<String>,
    #[serde(default)]
    pub post_tag: Option<String>,
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    /// `[lng, lat]`; switches to distance ordering
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl QueryData {
    pub fn new(index: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            search: search.into(),
            sorting: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
            pre_tag: None,
            post_tag: None,
            filters: Vec::new(),
            coordinates: None,
        }
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_sorting(mut self, sorting: impl Into<String>) -> Self {
        self.sorting = Some(sorting.into());
        self
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Type-ahead request across several collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiQueryData {
    pub indexes: Vec<String>,
    pub search: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Sort key in a compiled request
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Score(SortOrder),
    Field { field: String, order: SortOrder },
    GeoDistance { field: String, coordinates: [f64; 2], order: SortOrder },
}

impl SortKey {
    pub fn field(field: impl Into<String>, order: SortOrder) -> Self {
        Self::Field {
            field: field.into(),
            order,
        }
    }
}

/// One highlighted field
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightField {
    pub name: String,
    /// Overrides the matching query for fragment selection only
    pub query: Option<Clause>,
}

/// Highlight section of a compiled request
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSpec {
    pub pre_tag: String,
    pub post_tag: String,
    pub fields: Vec<HighlightField>,
    pub fragment_size: usize,
    pub no_match_size: usize,
}

/// Backend-shaped single-collection request. Discarded after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub index: String,
    pub from: usize,
    pub size: usize,
    pub tokens: Vec<QueryToken>,
    /// Matching query (scores and selects)
    pub query: Clause,
    /// Always-on plus dynamic filters
    pub filters: Vec<Clause>,
    pub script: ScoreExpr,
    pub sort: Vec<SortKey>,
    pub highlight: Option<HighlightSpec>,
    pub source_excludes: Vec<String>,
    /// Names used when reshaping hits
    pub snippet_field: String,
    pub highlight_field: Option<String>,
}

/// Backend-shaped multi-collection request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMultiQuery {
    pub indexes: Vec<String>,
    pub from: usize,
    pub size: usize,
    pub query: Clause,
    pub source_excludes: Vec<String>,
}

/// Per-call compiler knobs. `now` is fixed for the whole request.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub now: DateTime<Utc>,
    pub origin: DateTime<Utc>,
    pub fuzziness: Fuzziness,
    pub tag_namespace: String,
}

impl CompileOptions {
    pub fn new(now: DateTime<Utc>, origin: DateTime<Utc>) -> Self {
        Self {
            now,
            origin,
            fuzziness: Fuzziness::default(),
            tag_namespace: "tag".to_string(),
        }
    }

    /// Build options from config, failing on an unparsable origin date.
    pub fn from_config(config: &SearchConfig, now: DateTime<Utc>) -> Result<Self, chrono::ParseError> {
        let origin = DateTime::parse_from_rfc3339(&config.search_origin_date)?.with_timezone(&Utc);
        Ok(Self {
            now,
            origin,
            fuzziness: Fuzziness::Edits(config.fuzziness),
            tag_namespace: config.tag_namespace.clone(),
        })
    }
}
