// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Client-Side Search Proxy
//!
//! Mirrors the method surface of a hosted multi-index search SDK but routes
//! every `search` through one POST to the gateway. Results are cached by the
//! serialized request body; an identical request made while the first is
//! still in flight awaits the same shared future.
//!
//! ```rust,no_run
//! use search_gateway::client::SearchClient;
//! use search_gateway::service::WireSearchQuery;
//!
//! # async fn example() {
//! let client = SearchClient::connect("http://localhost:3000", 1000);
//! let results = client
//!     .search(&[WireSearchQuery::new("posts", "rationality").with_page(0, 10)])
//!     .await
//!     .unwrap();
//! println!("{} hits", results[0].nb_hits);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use tracing::debug;

use crate::config::SearchConfig;
use crate::metrics;
use crate::service::{SearchResponse, WireSearchQuery};

use super::request_cache::{RequestCache, RequestCacheStats};
use super::transport::{ClientError, HttpTransport, Transport};

type SearchResult = Result<Arc<Vec<SearchResponse>>, ClientError>;
type SharedSearch = Shared<BoxFuture<'static, SearchResult>>;

/// SDK-shaped search client with request de-duplication
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    cache: RequestCache<SharedSearch>,
    headers: RwLock<HashMap<String, String>>,
}

impl SearchClient {
    pub fn new(transport: Arc<dyn Transport>, cache_size: usize) -> Self {
        Self {
            transport,
            cache: RequestCache::new(cache_size),
            headers: RwLock::new(HashMap::new()),
        }
    }

    /// Client over HTTP against a gateway base URL
    pub fn connect(base_url: &str, cache_size: usize) -> Self {
        Self::new(Arc::new(HttpTransport::new(base_url)), cache_size)
    }

    /// HTTP client sized by `client_cache_size`
    pub fn from_config(base_url: &str, config: &SearchConfig) -> Self {
        Self::connect(base_url, config.client_cache_size)
    }

    /// Run a batch of index queries in one request. Results keep request order.
    pub async fn search(&self, queries: &[WireSearchQuery]) -> Result<Vec<SearchResponse>, ClientError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::to_string(queries).map_err(|e| ClientError::Encode(e.to_string()))?;
        let (future, hit) = self.cache.get_or_insert_with(&body, || {
            let transport = self.transport.clone();
            let headers = self.headers.read().clone();
            let request = body.clone();
            async move { transport.post_search(request, headers).await.map(Arc::new) }
                .boxed()
                .shared()
        });
        metrics::record_client_cache(if hit { "hit" } else { "miss" });
        metrics::set_client_cache_entries(self.cache.len());
        debug!(queries = queries.len(), cached = hit, "Client search");

        match future.clone().await {
            Ok(results) => Ok(results.as_ref().clone()),
            Err(e) => {
                self.forget_failed(&body, &future);
                Err(e)
            }
        }
    }

    /// Failures are never served from cache. Only the failed request's own
    /// entry is dropped; a newer in-flight request for the same body stays.
    fn forget_failed(&self, body: &str, failed: &SharedSearch) {
        if self.cache.remove_if(body, |cached| cached.ptr_eq(failed)) {
            metrics::set_client_cache_entries(self.cache.len());
        }
    }

    /// Facet search is not offered by the gateway
    pub async fn search_for_facet_values(&self, _queries: &[WireSearchQuery]) -> Result<Vec<SearchResponse>, ClientError> {
        Err(ClientError::NotSupported("searchForFacetValues"))
    }

    /// Per-index handles are not offered by the gateway
    pub fn init_index(&self, _name: &str) -> Result<(), ClientError> {
        Err(ClientError::NotSupported("initIndex"))
    }

    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers.read().get(name).cloned()
    }

    /// Header sent with every subsequent request
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.headers.write().insert(name.into(), value.into());
        self
    }

    pub fn unset_header(&self, name: &str) -> &Self {
        self.headers.write().remove(name);
        self
    }

    /// Forget every cached result
    pub fn clear_cache(&self) {
        self.cache.clear();
        metrics::set_client_cache_entries(0);
    }

    pub fn cache_stats(&self) -> RequestCacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Exhaustive, ProcessingTimings, RoundTrip};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Echo transport: one empty response per query, counting calls
    #[derive(Default)]
    struct CountingTransport {
        calls: Mutex<Vec<(String, HashMap<String, String>)>>,
        fail: bool,
        delay: Option<Duration>,
    }

    fn empty_response(index: &str) -> SearchResponse {
        SearchResponse {
            hits: vec![],
            nb_hits: 0,
            page: 0,
            nb_pages: 0,
            hits_per_page: 10,
            exhaustive_nb_hits: true,
            exhaustive_type: true,
            exhaustive: Exhaustive { nb_hits: true, typo: true },
            query: String::new(),
            params: String::new(),
            index: index.into(),
            processing_time_ms: 0,
            processing_timings_ms: ProcessingTimings {
                request: RoundTrip { round_trip: 0 },
            },
            server_time_ms: 0,
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn post_search(
            &self,
            body: String,
            headers: HashMap<String, String>,
        ) -> Result<Vec<SearchResponse>, ClientError> {
            self.calls.lock().push((body.clone(), headers));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ClientError::Status {
                    status: 400,
                    message: "Invalid sorting: x".into(),
                });
            }
            let queries: Vec<WireSearchQuery> =
                serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
            Ok(queries.iter().map(|q| empty_response(&q.index_name)).collect())
        }
    }

    fn client(transport: CountingTransport) -> (SearchClient, Arc<CountingTransport>) {
        let transport = Arc::new(transport);
        (SearchClient::new(transport.clone(), 100), transport)
    }

    #[tokio::test]
    async fn test_concurrent_identical_searches_share_one_call() {
        let (client, transport) = client(CountingTransport {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let queries = vec![WireSearchQuery::new("posts", "hello")];

        let (a, b) = tokio::join!(client.search(&queries), client.search(&queries));
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.calls.lock().len(), 1);
        assert_eq!(client.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_sequential_identical_searches_hit_cache() {
        let (client, transport) = client(CountingTransport::default());
        let queries = vec![WireSearchQuery::new("posts", "hello")];
        client.search(&queries).await.unwrap();
        client.search(&queries).await.unwrap();
        assert_eq!(transport.calls.lock().len(), 1);

        client.clear_cache();
        client.search(&queries).await.unwrap();
        assert_eq!(transport.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_is_one_call_in_order() {
        let (client, transport) = client(CountingTransport::default());
        let results = client
            .search(&[WireSearchQuery::new("posts", "a"), WireSearchQuery::new("tags", "a")])
            .await
            .unwrap();
        assert_eq!(results[0].index, "posts");
        assert_eq!(results[1].index, "tags");
        assert_eq!(transport.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let (client, transport) = client(CountingTransport::default());
        assert!(client.search(&[]).await.unwrap().is_empty());
        assert!(transport.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (client, transport) = client(CountingTransport {
            fail: true,
            ..Default::default()
        });
        let queries = vec![WireSearchQuery::new("posts", "x")];
        let err = client.search(&queries).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
        assert!(client.search(&queries).await.is_err());
        assert_eq!(transport.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let (client, _) = client(CountingTransport::default());
        assert_eq!(client.init_index("posts"), Err(ClientError::NotSupported("initIndex")));
        assert_eq!(
            client.search_for_facet_values(&[]).await,
            Err(ClientError::NotSupported("searchForFacetValues"))
        );
    }

    #[tokio::test]
    async fn test_headers_are_sent() {
        let (client, transport) = client(CountingTransport::default());
        client.set_header("X-Session", "abc").set_header("X-Other", "1");
        assert_eq!(client.get_header("X-Session").as_deref(), Some("abc"));
        client.unset_header("X-Other");
        assert_eq!(client.get_header("X-Other"), None);

        client.search(&[WireSearchQuery::new("posts", "x")]).await.unwrap();
        let calls = transport.calls.lock();
        assert_eq!(calls[0].1.get("X-Session").map(String::as_str), Some("abc"));
        assert!(!calls[0].1.contains_key("X-Other"));
    }

    #[tokio::test]
    async fn test_stale_failure_keeps_newer_in_flight_request() {
        let (client, transport) = client(CountingTransport {
            delay: Some(Duration::from_millis(30)),
            ..Default::default()
        });
        let queries = vec![WireSearchQuery::new("posts", "hello")];
        let body = serde_json::to_string(&queries).unwrap();
        let failed: SharedSearch = async { Err::<Arc<Vec<SearchResponse>>, _>(ClientError::Transport("reset".into())) }
            .boxed()
            .shared();

        // A late waiter on an older failed request cleans up while a fresh
        // request for the same body is in flight
        let (first, second) = tokio::join!(client.search(&queries), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            client.forget_failed(&body, &failed);
            client.search(&queries).await
        });

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(transport.calls.lock().len(), 1);
    }

    #[test]
    fn test_from_config_uses_client_cache_size() {
        let config = SearchConfig {
            client_cache_size: 0,
            ..Default::default()
        };
        let client = SearchClient::from_config("http://localhost:3000", &config);
        assert_eq!(client.cache_stats().entry_count, 0);
        client
            .cache
            .get_or_insert_with("body", || async { Ok::<_, ClientError>(Arc::new(Vec::new())) }.boxed().shared());
        assert!(client.cache.is_empty());
    }
}
