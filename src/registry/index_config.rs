//! Index Configuration
//!
//! Per-collection search configuration: searchable fields, snippet and
//! highlight fields, ranking rules, always-on filters and field mappings.
//!
//! # Example
//!
//! ```text
//! Posts  (index "posts")
//!   fields      title^3, authorDisplayName^4, body
//!   snippet     body
//!   highlight   title
//!   ranking     baseScore numeric pivot 20 weight 8 desc
//!   tiebreaker  publicDateMs
//!   filters     draft == false, isFuture == false
//!   private     draft, isFuture
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::search::{Clause, Ranking};

/// Field used by the karma sort when a config names none
pub const DEFAULT_KARMA_FIELD: &str = "baseScore";

/// How a field is indexed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingKind {
    /// Analyzed text with an `.exact` sub-field
    FullText,
    /// Exact keyword with a `.sort` sub-field
    Keyword,
    GeoPoint,
    Nested,
}

impl std::fmt::Display for MappingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingKind::FullText => write!(f, "text"),
            MappingKind::Keyword => write!(f, "keyword"),
            MappingKind::GeoPoint => write!(f, "geo_point"),
            MappingKind::Nested => write!(f, "nested"),
        }
    }
}

/// Search configuration of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Collection name (e.g. "Posts")
    pub collection: String,
    /// Physical index / alias name (e.g. "posts")
    pub index: String,
    /// Searchable fields in priority order, optionally boosted (`title^3`)
    pub fields: Vec<String>,
    pub snippet: String,
    pub highlight: Option<String>,
    pub ranking: Vec<Ranking>,
    pub tiebreaker: String,
    /// Always-on filters
    pub filters: Vec<Clause>,
    pub mappings: HashMap<String, MappingKind>,
    /// Redacted from every response
    pub private_fields: Vec<String>,
    pub karma_field: Option<String>,
    pub location_field: Option<String>,
}

impl IndexConfig {
    /// Create a new config; the index name defaults to the lowercase collection name
    pub fn new(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            index: collection.to_lowercase(),
            collection,
            fields: Vec::new(),
            snippet: String::new(),
            highlight: None,
            ranking: Vec::new(),
            tiebreaker: "_id".to_string(),
            filters: Vec::new(),
            mappings: HashMap::new(),
            private_fields: Vec::new(),
            karma_field: None,
            location_field: None,
        }
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Add a searchable field (`name` or `name^boost`)
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn snippet(mut self, field: impl Into<String>) -> Self {
        self.snippet = field.into();
        self
    }

    pub fn highlight(mut self, field: impl Into<String>) -> Self {
        self.highlight = Some(field.into());
        self
    }

    pub fn rank(mut self, ranking: Ranking) -> Self {
        self.ranking.push(ranking);
        self
    }

    pub fn tiebreaker(mut self, field: impl Into<String>) -> Self {
        self.tiebreaker = field.into();
        self
    }

    pub fn filter(mut self, clause: Clause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn mapping(mut self, field: impl Into<String>, kind: MappingKind) -> Self {
        self.mappings.insert(field.into(), kind);
        self
    }

    pub fn private_field(mut self, field: impl Into<String>) -> Self {
        self.private_fields.push(field.into());
        self
    }

    pub fn karma_field(mut self, field: impl Into<String>) -> Self {
        self.karma_field = Some(field.into());
        self
    }

    pub fn location_field(mut self, field: impl Into<String>) -> Self {
        self.location_field = Some(field.into());
        self.mapping_for_location()
    }

    fn mapping_for_location(mut self) -> Self {
        if let Some(field) = self.location_field.clone() {
            self.mappings.entry(field).or_insert(MappingKind::GeoPoint);
        }
        self
    }

    /// First configured field without its boost suffix
    pub fn primary_field(&self) -> Option<&str> {
        self.fields.first().map(|f| strip_boost(f))
    }

    /// Field used by the `karma` sort
    pub fn karma_field_or_default(&self) -> &str {
        self.karma_field.as_deref().unwrap_or(DEFAULT_KARMA_FIELD)
    }

    /// Whether the field is analyzed text (searchable or explicitly mapped as such)
    pub fn is_full_text_field(&self, field: &str) -> bool {
        match self.mappings.get(field) {
            Some(kind) => *kind == MappingKind::FullText,
            None => self.fields.iter().any(|f| strip_boost(f) == field),
        }
    }

    pub fn mapping_kind(&self, field: &str) -> Option<MappingKind> {
        self.mappings.get(field).copied()
    }
}

/// `title^3` -> `title`
pub fn strip_boost(field: &str) -> &str {
    field.split('^').next().unwrap_or(field)
}

/// `title^3` -> `title.exact^3` (boost kept when `keep_boost`)
pub fn exact_field(field: &str, keep_boost: bool) -> String {
    match field.split_once('^') {
        Some((name, boost)) if keep_boost => format!("{}.exact^{}", name, boost),
        Some((name, _)) => format!("{}.exact", name),
        None => format!("{}.exact", field),
    }
}
