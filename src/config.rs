//! Configuration for the search gateway.
//!
//! # Example
//!
//! ```
//! use search_gateway::SearchConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SearchConfig::default();
//! assert_eq!(config.default_hits_per_page, 10);
//!
//! // Full config
//! let config = SearchConfig {
//!     elastic_url: Some("http://localhost:9200".into()),
//!     index_prefix: Some("staging_".into()),
//!     fuzziness: 2,
//!     ..Default::default()
//! };
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the search gateway.
///
/// All fields have defaults. Without `elastic_url` the service runs with no
/// backend and every query fails with `BackendError::Unavailable`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Elasticsearch base URL (e.g., "http://localhost:9200")
    #[serde(default)]
    pub elastic_url: Option<String>,

    /// Basic auth credentials
    #[serde(default)]
    pub elastic_username: Option<String>,
    #[serde(default)]
    pub elastic_password: Option<String>,

    /// Per-request backend timeout (default: 10s)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Environment prefix stripped from wire index names (e.g., "staging_")
    #[serde(default)]
    pub index_prefix: Option<String>,

    /// Origin of the date-decay ranking curve (RFC 3339)
    #[serde(default = "default_search_origin_date")]
    pub search_origin_date: String,

    /// Max edit distance for fuzzy matches
    #[serde(default = "default_fuzziness")]
    pub fuzziness: u8,

    /// Prefix word marking tag tokens (`tag:slug`)
    #[serde(default = "default_tag_namespace")]
    pub tag_namespace: String,

    /// Page size when a wire query omits `hitsPerPage`
    #[serde(default = "default_hits_per_page")]
    pub default_hits_per_page: usize,

    /// HTTP listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Client-side request cache entries
    #[serde(default = "default_client_cache_size")]
    pub client_cache_size: usize,
}

fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_search_origin_date() -> String { "2014-06-01T00:00:00Z".to_string() }
fn default_fuzziness() -> u8 { 1 }
fn default_tag_namespace() -> String { "tag".to_string() }
fn default_hits_per_page() -> usize { 10 }
fn default_bind_addr() -> String { "127.0.0.1:3000".to_string() }
fn default_client_cache_size() -> usize { 1000 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            elastic_url: None,
            elastic_username: None,
            elastic_password: None,
            request_timeout_ms: default_request_timeout_ms(),
            index_prefix: None,
            search_origin_date: default_search_origin_date(),
            fuzziness: default_fuzziness(),
            tag_namespace: default_tag_namespace(),
            default_hits_per_page: default_hits_per_page(),
            bind_addr: default_bind_addr(),
            client_cache_size: default_client_cache_size(),
        }
    }
}

/// Error loading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SearchConfig {
    /// Load from a JSON file; absent keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Strip the environment prefix from a wire index name
    pub fn strip_index_prefix<'a>(&self, index: &'a str) -> &'a str {
        match &self.index_prefix {
            Some(prefix) => index.strip_prefix(prefix.as_str()).unwrap_or(index),
            None => index,
        }
    }
}
