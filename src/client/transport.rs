use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;

use crate::http::SEARCH_PATH;
use crate::service::SearchResponse;

/// Client-side failure; cloneable so de-duplicated waiters can share it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0} is not supported by this search backend")]
    NotSupported(&'static str),
    #[error("Failed to encode search request: {0}")]
    Encode(String),
    #[error("Search request failed: {0}")]
    Transport(String),
    #[error("Search failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid search response: {0}")]
    Decode(String),
}

/// Sends a serialized search batch to the gateway
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_search(
        &self,
        body: String,
        headers: HashMap<String, String>,
    ) -> Result<Vec<SearchResponse>, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest transport against `{base_url}/api/search`
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SEARCH_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_search(
        &self,
        body: String,
        headers: HashMap<String, String>,
    ) -> Result<Vec<SearchResponse>, ClientError> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<SearchResponse>>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            HttpTransport::new("http://localhost:3000/").endpoint(),
            "http://localhost:3000/api/search"
        );
    }

    #[test]
    fn test_not_supported_message() {
        assert_eq!(
            ClientError::NotSupported("initIndex").to_string(),
            "initIndex is not supported by this search backend"
        );
    }
}
