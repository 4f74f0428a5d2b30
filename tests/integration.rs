//! Integration Tests for the Search Gateway
//!
//! Each test boots the axum router on an ephemeral port, backed by an
//! in-memory search backend, and talks to it over real HTTP through the
//! client proxy (or raw reqwest for malformed bodies).
//!
//! # Running Tests
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//! - `happy_*` - Batches, ordering, de-duplication, compiled request shape
//! - `failure_*` - Malformed batches, unknown indexes, backend outages

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};

use search_gateway::backend::BackendError;
use search_gateway::http::{self, MULTI_SEARCH_PATH, SEARCH_PATH};
use search_gateway::service::WireSearchQuery;
use search_gateway::{ClientError, InMemoryBackend, IndexRegistry, SearchClient, SearchConfig, SearchService};

// =============================================================================
// Server Helpers
// =============================================================================

struct TestServer {
    base_url: String,
    backend: Arc<InMemoryBackend>,
}

async fn spawn_server(backend: InMemoryBackend) -> TestServer {
    let backend = Arc::new(backend);
    let service = Arc::new(SearchService::new(
        Arc::new(IndexRegistry::standard()),
        Some(backend.clone()),
        SearchConfig::default(),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, http::router(service)).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        backend,
    }
}

fn doc(source: Value) -> Map<String, Value> {
    source.as_object().cloned().unwrap()
}

fn seed(backend: &InMemoryBackend) {
    backend.set_documents(
        "posts",
        vec![
            ("p1".into(), doc(json!({"title": "Making Beliefs Pay Rent", "baseScore": 120, "draft": false}))),
            ("p2".into(), doc(json!({"title": "Rent Seeking", "baseScore": 15, "draft": false}))),
        ],
    );
    backend.set_documents(
        "tags",
        vec![("t1".into(), doc(json!({"name": "Rationality", "adminOnly": false, "deleted": false})))],
    );
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn happy_batch_preserves_request_order() {
    let backend = InMemoryBackend::new();
    seed(&backend);
    let server = spawn_server(backend).await;
    let client = SearchClient::connect(&server.base_url, 100);

    let results = client
        .search(&[
            WireSearchQuery::new("tags", "rationality"),
            WireSearchQuery::new("posts", "rent").with_page(0, 5),
            WireSearchQuery::new("users", "eliezer"),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].index, "tags");
    assert_eq!(results[1].index, "posts");
    assert_eq!(results[2].index, "users");

    assert_eq!(results[1].nb_hits, 2);
    assert_eq!(results[1].nb_pages, 1);
    assert_eq!(results[1].hits_per_page, 5);
    assert_eq!(results[1].hits[0]["_id"], "p1");
    assert!(results[1].hits[0].get("draft").is_none());
    assert_eq!(results[1].hits[0]["_highlightResult"]["title"]["matchLevel"], "none");

    assert!(results[0].hits[0].get("adminOnly").is_none());
    assert_eq!(results[2].nb_hits, 0);
    assert_eq!(server.backend.request_count(), 3);
}

#[tokio::test]
async fn happy_identical_concurrent_searches_are_deduplicated() {
    let backend = InMemoryBackend::new().with_delay(Duration::from_millis(30));
    seed(&backend);
    let server = spawn_server(backend).await;
    let client = SearchClient::connect(&server.base_url, 100);

    let queries = vec![WireSearchQuery::new("posts", "rent")];
    let (a, b) = tokio::join!(client.search(&queries), client.search(&queries));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(server.backend.request_count(), 1);

    // A different body is a different request
    client.search(&[WireSearchQuery::new("posts", "beliefs")]).await.unwrap();
    assert_eq!(server.backend.request_count(), 2);
}

#[tokio::test]
async fn happy_advanced_query_reaches_backend_compiled() {
    let server = spawn_server(InMemoryBackend::new()).await;
    let client = SearchClient::connect(&server.base_url, 100);

    client
        .search(&[WireSearchQuery::new("posts", r#""pay rent" -seeking user:eliezer"#).with_tags("<b>", "</b>")])
        .await
        .unwrap();

    let (index, body) = &server.backend.requests()[0];
    assert_eq!(index, "posts");
    let outer = &body["query"]["script_score"]["query"]["bool"];
    assert!(outer["filter"].is_array());
    let matching = &outer["must"][0]["bool"];
    assert!(matching["must"][0]["multi_match"].is_object());
    assert!(matching["must_not"][0]["multi_match"].is_object());

    let highlight_fields = body["highlight"]["fields"].as_object().unwrap();
    assert!(!highlight_fields.is_empty());
    for config in highlight_fields.values() {
        assert_eq!(config["pre_tags"], json!(["<b>"]));
        assert_eq!(config["post_tags"], json!(["</b>"]));
    }
    assert!(body["_source"]["excludes"]
        .as_array()
        .unwrap()
        .contains(&json!("exportedAt")));
}

#[tokio::test]
async fn happy_multi_collection_search() {
    let server = spawn_server(InMemoryBackend::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", server.base_url, MULTI_SEARCH_PATH))
        .json(&json!({"indexes": ["posts", "tags"], "search": "rat", "offset": 0, "limit": 5}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["nbHits"], 0);
    assert_eq!(body["indexes"], json!(["posts", "tags"]));
    assert_eq!(server.backend.requests()[0].0, "posts,tags");
}

// =============================================================================
// Failure Scenarios
// =============================================================================

#[tokio::test]
async fn failure_malformed_element_rejects_whole_batch() {
    let server = spawn_server(InMemoryBackend::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", server.base_url, SEARCH_PATH))
        .json(&json!([
            {"indexName": "posts", "params": {"query": "rent"}},
            {"indexName": "posts"}
        ]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("position 1"));
    assert_eq!(server.backend.request_count(), 0);
}

#[tokio::test]
async fn failure_non_array_body() {
    let server = spawn_server(InMemoryBackend::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", server.base_url, SEARCH_PATH))
        .json(&json!({"indexName": "posts"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Expected an array of search queries");
}

#[tokio::test]
async fn failure_multi_search_without_indexes() {
    let server = spawn_server(InMemoryBackend::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}{}", server.base_url, MULTI_SEARCH_PATH))
        .json(&json!({"indexes": [], "search": "x"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No indexes requested");
    assert_eq!(server.backend.request_count(), 0);
}

#[tokio::test]
async fn failure_unknown_index_fails_batch() {
    let server = spawn_server(InMemoryBackend::new()).await;
    let client = SearchClient::connect(&server.base_url, 100);

    let err = client
        .search(&[WireSearchQuery::new("posts", "x"), WireSearchQuery::new("unicorns", "x")])
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("unicorns"), "message: {}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn failure_backend_outage_is_not_cached() {
    let server = spawn_server(InMemoryBackend::new()).await;
    let client = SearchClient::connect(&server.base_url, 100);
    let queries = vec![WireSearchQuery::new("posts", "rent")];

    server.backend.fail_with(BackendError::Status {
        status: 503,
        body: "cluster unavailable".into(),
    });
    assert!(matches!(
        client.search(&queries).await,
        Err(ClientError::Status { status: 400, .. })
    ));

    server.backend.clear_failure();
    let results = client.search(&queries).await.unwrap();
    assert_eq!(results[0].index, "posts");
    assert_eq!(server.backend.request_count(), 2);
}

#[tokio::test]
async fn failure_unreachable_gateway() {
    let client = SearchClient::connect("http://127.0.0.1:1", 100);
    let err = client.search(&[WireSearchQuery::new("posts", "x")]).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
