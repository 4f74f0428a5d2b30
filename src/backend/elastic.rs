// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Elasticsearch backend over HTTP.
//!
//! ```text
//! POST {elastic_url}/{index}/_search
//! Authorization: Basic ...      (when credentials are configured)
//! Content-Type: application/json
//!
//! <compiled request body>
//! ```
//!
//! No retries: failures surface to the caller immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SearchConfig;

use super::traits::{BackendError, RawSearchResponse, SearchBackend};

pub struct ElasticBackend {
    http_client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl ElasticBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
            timeout,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Backend for the configured cluster; `None` when no URL is configured
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        let url = config.elastic_url.as_ref()?;
        let backend = Self::new(url.as_str(), config.request_timeout());
        Some(match &config.elastic_username {
            Some(username) => backend.with_basic_auth(username.as_str(), config.elastic_password.clone()),
            None => backend,
        })
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.base_url, index)
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, BackendError> {
        let url = self.search_url(index);
        debug!(%url, "Dispatching search request");

        let mut request = self.http_client.post(url).json(body).timeout(self.timeout);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(index, status = status.as_u16(), "Search request rejected by backend");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RawSearchResponse>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "elastic"
    }
}
