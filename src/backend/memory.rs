use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::traits::{BackendError, RawHit, RawHits, RawSearchResponse, SearchBackend, TotalHits};

/// Canned-response backend for tests and local development.
///
/// Every request is recorded. Indexes without a canned response return zero hits.
pub struct InMemoryBackend {
    responses: DashMap<String, RawSearchResponse>,
    requests: Mutex<Vec<(String, Value)>>,
    failure: Mutex<Option<BackendError>>,
    delay: Option<Duration>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: DashMap::new(),
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: None,
        }
    }

    /// Sleep before answering each request
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer requests for `index` with `response`
    pub fn set_response(&self, index: impl Into<String>, response: RawSearchResponse) {
        self.responses.insert(index.into(), response);
    }

    /// Answer requests for `index` with these `(id, source)` documents, in order
    pub fn set_documents(&self, index: &str, documents: Vec<(String, Map<String, Value>)>) {
        let hits: Vec<RawHit> = documents
            .into_iter()
            .map(|(id, source)| RawHit {
                id,
                index: index.to_string(),
                score: Some(1.0),
                source,
                highlight: Default::default(),
            })
            .collect();
        self.set_response(
            index,
            RawSearchResponse {
                took: 1,
                hits: RawHits {
                    total: Some(TotalHits::Tracked {
                        value: hits.len() as u64,
                    }),
                    hits,
                },
            },
        );
    }

    /// Fail every following request with `error`
    pub fn fail_with(&self, error: BackendError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Recorded `(index, body)` pairs, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, BackendError> {
        self.requests.lock().push((index.to_string(), body.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        Ok(self.responses.get(index).map(|r| r.value().clone()).unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_index_is_empty() {
        let backend = InMemoryBackend::new();
        let response = backend.search("posts", &json!({})).await.unwrap();
        assert_eq!(response.total_hits(), 0);
        assert!(response.hits.hits.is_empty());
    }

    #[tokio::test]
    async fn test_documents_are_returned() {
        let backend = InMemoryBackend::new();
        backend.set_documents(
            "posts",
            vec![
                ("a".into(), doc(json!({"title": "A"}))),
                ("b".into(), doc(json!({"title": "B"}))),
            ],
        );
        let response = backend.search("posts", &json!({"size": 10})).await.unwrap();
        assert_eq!(response.total_hits(), 2);
        assert_eq!(response.hits.hits[1].id, "b");
        assert_eq!(response.hits.hits[1].index, "posts");
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let backend = InMemoryBackend::new();
        backend.search("posts", &json!({"from": 0})).await.unwrap();
        backend.search("tags", &json!({"from": 10})).await.unwrap();
        let requests = backend.requests();
        assert_eq!(backend.request_count(), 2);
        assert_eq!(requests[1], ("tags".to_string(), json!({"from": 10})));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = InMemoryBackend::new();
        backend.fail_with(BackendError::Request("boom".into()));
        assert_eq!(
            backend.search("posts", &json!({})).await.unwrap_err(),
            BackendError::Request("boom".into())
        );
        backend.clear_failure();
        assert!(backend.search("posts", &json!({})).await.is_ok());
    }
}
