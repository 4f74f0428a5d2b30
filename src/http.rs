// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP Boundary
//!
//! ```text
//! POST /api/search         [WireSearchQuery, ...] → [SearchResponse, ...]
//! POST /api/search/multi   MultiQueryData         → MultiSearchResponse
//! ```
//!
//! A batch is all-or-nothing: one malformed element rejects the whole body
//! before anything runs, and one failed query fails the whole batch. Every
//! failure answers `400 {"error": message}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::future::try_join_all;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::metrics;
use crate::search::MultiQueryData;
use crate::service::{parse_batch, MultiSearchResponse, SearchResponse, SearchService, ValidationError};

pub const SEARCH_PATH: &str = "/api/search";
pub const MULTI_SEARCH_PATH: &str = "/api/search/multi";

/// Batch-level failure response
#[derive(Debug)]
pub struct ApiError(pub SearchError);

impl<E: Into<SearchError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

pub fn router(service: Arc<SearchService>) -> Router {
    Router::new()
        .route(SEARCH_PATH, post(handle_search))
        .route(MULTI_SEARCH_PATH, post(handle_multi_search))
        .with_state(service)
}

async fn handle_search(
    State(service): State<Arc<SearchService>>,
    body: Bytes,
) -> Result<Json<Vec<SearchResponse>>, ApiError> {
    let queries = parse_batch(&body).map_err(|e| {
        warn!(error = %e, "Rejected search batch");
        metrics::record_batch("rejected");
        e
    })?;
    metrics::record_batch_size(queries.len());

    // Fan out; the first failure drops the rest
    match try_join_all(queries.iter().map(|q| service.run_query(q))).await {
        Ok(results) => {
            debug!(count = results.len(), "Search batch complete");
            metrics::record_batch("success");
            Ok(Json(results))
        }
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "Search batch failed");
            metrics::record_batch("error");
            Err(e.into())
        }
    }
}

async fn handle_multi_search(
    State(service): State<Arc<SearchService>>,
    body: Bytes,
) -> Result<Json<MultiSearchResponse>, ApiError> {
    let data: MultiQueryData =
        serde_json::from_slice(&body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    let response = service.run_multi_query(&data).await.map_err(|e| {
        warn!(error = %e, "Multi-collection search failed");
        e
    })?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_bad_request() {
        let response = ApiError::from(ValidationError::NotAnArray).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_from_backend() {
        let err = ApiError::from(crate::backend::BackendError::Unavailable);
        assert_eq!(err.0.to_string(), "Search backend is not configured");
    }
}
