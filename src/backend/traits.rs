use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Search backend is not configured")]
    Unavailable,
    #[error("Backend request failed: {0}")]
    Request(String),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid backend response: {0}")]
    Decode(String),
}

/// Total hit count; older clusters return a bare number, newer ones `{value, relation}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Tracked { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            Self::Count(n) | Self::Tracked { value: n } => *n,
        }
    }
}

/// One raw hit as returned by `_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Null when sorting by something other than score without `track_scores`
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
    /// field -> fragments
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawHits {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// Raw `_search` response (only the parts the gateway reads)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub hits: RawHits,
}

impl RawSearchResponse {
    /// Normalized total; falls back to the page length when the count is absent
    pub fn total_hits(&self) -> u64 {
        self.hits
            .total
            .map(|t| t.value())
            .unwrap_or(self.hits.hits.len() as u64)
    }
}

/// Search backend executing compiled request bodies.
///
/// `index` may be a comma-separated list for multi-collection requests.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, BackendError>;

    /// Short name for logs
    fn name(&self) -> &'static str {
        "backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_hits_both_shapes() {
        let scalar: RawSearchResponse = serde_json::from_value(json!({
            "took": 3,
            "hits": {"total": 42, "hits": []}
        }))
        .unwrap();
        assert_eq!(scalar.total_hits(), 42);

        let tracked: RawSearchResponse = serde_json::from_value(json!({
            "took": 3,
            "hits": {"total": {"value": 7, "relation": "eq"}, "hits": []}
        }))
        .unwrap();
        assert_eq!(tracked.total_hits(), 7);
    }

    #[test]
    fn test_raw_hit_defaults() {
        let hit: RawHit = serde_json::from_value(json!({
            "_id": "abc",
            "_score": null,
            "_source": {"title": "Hello"}
        }))
        .unwrap();
        assert_eq!(hit.id, "abc");
        assert_eq!(hit.score, None);
        assert!(hit.highlight.is_empty());
        assert_eq!(hit.source["title"], "Hello");
    }

    #[test]
    fn test_missing_total_uses_page_length() {
        let response: RawSearchResponse = serde_json::from_value(json!({
            "hits": {"hits": [{"_id": "a"}, {"_id": "b"}]}
        }))
        .unwrap();
        assert_eq!(response.total_hits(), 2);
    }
}
