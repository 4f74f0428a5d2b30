// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the search gateway.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `search_gateway_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `index`: physical index name (`posts`, `multi` for multi-collection)
//! - `status`: success, error, rejected
//! - `outcome`: hit, miss

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record one executed query
pub fn record_query(index: &str, status: &str) {
    counter!(
        "search_gateway_queries_total",
        "index" => index.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record compile + execute latency of one query
pub fn record_query_latency(index: &str, duration: Duration) {
    histogram!(
        "search_gateway_query_seconds",
        "index" => index.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record the number of hits returned by one query
pub fn record_results(count: usize) {
    histogram!("search_gateway_results").record(count as f64);
}

/// Record the number of queries in an HTTP batch
pub fn record_batch_size(count: usize) {
    histogram!("search_gateway_batch_size").record(count as f64);
}

/// Record a batch outcome (success, error, rejected)
pub fn record_batch(status: &str) {
    counter!(
        "search_gateway_batches_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a client-side request cache lookup
pub fn record_client_cache(outcome: &str) {
    counter!(
        "search_gateway_client_cache_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Set the current client-side cache entry count
pub fn set_client_cache_entries(count: usize) {
    gauge!("search_gateway_client_cache_entries").set(count as f64);
}

/// Times one query; records latency on drop.
pub struct QueryTimer {
    index: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            start: Instant::now(),
        }
    }

    /// Elapsed whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        record_query_latency(&self.index, self.start.elapsed());
    }
}
