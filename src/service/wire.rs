//! Wire types for the batched search endpoint.
//!
//! Request: JSON array of
//!
//! ```text
//! {"indexName": "posts", "params": {"query": "...", "hitsPerPage": 10, "page": 0,
//!                                   "highlightPreTag": "<b>", "highlightPostTag": "</b>"}}
//! ```
//!
//! Response: JSON array (same order) of [`SearchResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Expected an array of search queries")]
    NotAnArray,
    #[error("Invalid search query at position {position}: {reason}")]
    InvalidQuery { position: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSearchParams {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_pre_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_post_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// One query of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSearchQuery {
    pub index_name: String,
    pub params: WireSearchParams,
}

impl WireSearchQuery {
    pub fn new(index_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            params: WireSearchParams {
                query: query.into(),
                highlight_pre_tag: None,
                highlight_post_tag: None,
                hits_per_page: None,
                page: None,
            },
        }
    }

    pub fn with_page(mut self, page: u32, hits_per_page: u32) -> Self {
        self.params.page = Some(page);
        self.params.hits_per_page = Some(hits_per_page);
        self
    }

    pub fn with_tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.params.highlight_pre_tag = Some(pre.into());
        self.params.highlight_post_tag = Some(post.into());
        self
    }
}

/// Validate a whole batch. The first bad element rejects everything.
pub fn validate_batch(body: &Value) -> Result<Vec<WireSearchQuery>, ValidationError> {
    let elements = body.as_array().ok_or(ValidationError::NotAnArray)?;
    elements
        .iter()
        .enumerate()
        .map(|(position, element)| {
            WireSearchQuery::deserialize(element).map_err(|e| ValidationError::InvalidQuery {
                position,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Parse and validate a raw request body
pub fn parse_batch(body: &[u8]) -> Result<Vec<WireSearchQuery>, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    validate_batch(&value)
}

/// Highlight fragment with its match level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightValue {
    pub value: String,
    /// "full" when the backend produced a fragment, otherwise "none"
    pub match_level: String,
}

impl HighlightValue {
    pub fn from_fragment(fragment: Option<&str>) -> Self {
        match fragment {
            Some(value) => Self {
                value: value.to_string(),
                match_level: "full".to_string(),
            },
            None => Self {
                value: String::new(),
                match_level: "none".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exhaustive {
    pub nb_hits: bool,
    pub typo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTrip {
    pub round_trip: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    pub request: RoundTrip,
}

/// Result envelope for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<Map<String, Value>>,
    pub nb_hits: u64,
    pub page: u32,
    pub nb_pages: u64,
    pub hits_per_page: u32,
    pub exhaustive_nb_hits: bool,
    pub exhaustive_type: bool,
    pub exhaustive: Exhaustive,
    pub query: String,
    pub params: String,
    pub index: String,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
    #[serde(rename = "processingTimingsMS")]
    pub processing_timings_ms: ProcessingTimings,
    #[serde(rename = "serverTimeMS")]
    pub server_time_ms: u64,
}

/// Result of a multi-collection query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchResponse {
    pub hits: Vec<Map<String, Value>>,
    pub nb_hits: u64,
    pub query: String,
    pub indexes: Vec<String>,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
}
