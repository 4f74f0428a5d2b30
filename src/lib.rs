//! # Search Gateway
//!
//! Compiles user search strings into Elasticsearch query documents with a
//! relevance-ranking script, runs them against the backend, and serves the
//! results in a hosted-search-SDK response shape.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Client Proxy                            │
//! │  • SDK-shaped search() over one batched POST               │
//! │  • De-duplicates identical in-flight requests              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (POST /api/search)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Boundary                           │
//! │  • Validates the whole batch before running anything       │
//! │  • Fans queries out concurrently, keeps request order      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Compiler + Registry                        │
//! │  • Tokenizer: quoted/negated/user:/tag: tokens             │
//! │  • Per-collection fields, filters, sort and ranking        │
//! │  • Painless script_score for karma/date/boolean boosts     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Execution Service                          │
//! │  • Backend dispatch (Elasticsearch or in-memory)           │
//! │  • Hit reshaping: _id, _snippetResult, _highlightResult    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_gateway::{SearchConfig, SearchService, http};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SearchConfig {
//!         elastic_url: Some("http://localhost:9200".into()),
//!         ..Default::default()
//!     };
//!     let bind_addr = config.bind_addr.clone();
//!     let service = Arc::new(SearchService::from_config(config));
//!
//!     let listener = tokio::net::TcpListener::bind(bind_addr).await.unwrap();
//!     axum::serve(listener, http::router(service)).await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`search`]: Tokenizer, query AST, ranking and the query compilers
//! - [`registry`]: Per-collection index configuration
//! - [`backend`]: Search backends (Elasticsearch, in-memory)
//! - [`service`]: Query execution and the wire contract
//! - [`http`]: axum routes for batched search
//! - [`client`]: Client-side proxy with request de-duplication

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod search;
pub mod service;

pub use backend::{BackendError, ElasticBackend, InMemoryBackend, SearchBackend};
pub use client::{ClientError, HttpTransport, SearchClient, Transport};
pub use config::SearchConfig;
pub use error::SearchError;
pub use registry::{ConfigError, IndexConfig, IndexRegistry};
pub use search::{compile_multi_query, compile_query, parse_query, CompileError, CompiledQuery, QueryData};
pub use service::{SearchResponse, SearchService, WireSearchQuery};
