// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Execution Service
//!
//! Compiles a wire query, dispatches it to the backend and reshapes the raw
//! response into the client envelope.
//!
//! # Flow
//!
//! ```text
//! WireSearchQuery
//!       │  strip index prefix, page/hitsPerPage → offset/limit
//!       ▼
//! compile_query (registry lookup)
//!       │
//!       ▼
//! SearchBackend::search ──→ RawSearchResponse
//!       │
//!       ▼
//! reshape hits (drop private fields, add _id/_snippetResult/_highlightResult)
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::backend::{BackendError, ElasticBackend, RawHit, SearchBackend};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::metrics::{self, QueryTimer};
use crate::registry::IndexRegistry;
use crate::search::{
    compile_multi_query, compile_query, resolve_index, CompileOptions, ElasticTranslator, MultiQueryData, QueryData,
};

use super::wire::{
    Exhaustive, HighlightValue, MultiSearchResponse, ProcessingTimings, RoundTrip, SearchResponse, WireSearchQuery,
};

/// Response key for the snippet highlight
pub const SNIPPET_RESULT_KEY: &str = "body";
/// Response key for the title highlight
pub const HIGHLIGHT_RESULT_KEY: &str = "title";

/// `ceil(nb_hits / hits_per_page)`; zero when the page size is zero
pub fn nb_pages(nb_hits: u64, hits_per_page: u64) -> u64 {
    if hits_per_page == 0 {
        0
    } else {
        nb_hits.div_ceil(hits_per_page)
    }
}

/// Executes compiled queries against a backend
pub struct SearchService {
    registry: Arc<IndexRegistry>,
    backend: Option<Arc<dyn SearchBackend>>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(registry: Arc<IndexRegistry>, backend: Option<Arc<dyn SearchBackend>>, config: SearchConfig) -> Self {
        Self {
            registry,
            backend,
            config,
        }
    }

    /// Standard registry plus an Elasticsearch backend when one is configured
    pub fn from_config(config: SearchConfig) -> Self {
        let backend = ElasticBackend::from_config(&config).map(|b| Arc::new(b) as Arc<dyn SearchBackend>);
        if backend.is_none() {
            warn!("No elastic_url configured; searches will fail as unavailable");
        }
        Self::new(Arc::new(IndexRegistry::standard()), backend, config)
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn backend(&self) -> Result<&Arc<dyn SearchBackend>, BackendError> {
        self.backend.as_ref().ok_or(BackendError::Unavailable)
    }

    fn compile_options(&self) -> Result<CompileOptions, SearchError> {
        Ok(CompileOptions::from_config(&self.config, Utc::now())?)
    }

    /// Run one wire query end to end
    pub async fn run_query(&self, query: &WireSearchQuery) -> Result<SearchResponse, SearchError> {
        let index = self.config.strip_index_prefix(&query.index_name).to_string();
        let timer = QueryTimer::new(index.as_str());
        let params = &query.params;

        let hits_per_page = params
            .hits_per_page
            .unwrap_or(self.config.default_hits_per_page as u32);
        let page = params.page.unwrap_or(0);

        let data = QueryData {
            pre_tag: params.highlight_pre_tag.clone(),
            post_tag: params.highlight_post_tag.clone(),
            ..QueryData::new(index.as_str(), params.query.as_str())
                .with_page(page as usize * hits_per_page as usize, hits_per_page as usize)
        };

        let result = self.execute(&data).await;
        metrics::record_query(&index, if result.is_ok() { "success" } else { "error" });
        let (hits, nb_hits, took) = result?;

        metrics::record_results(hits.len());
        let elapsed = timer.elapsed_ms();
        debug!(index = %index, nb_hits, elapsed_ms = elapsed, "Search query complete");

        Ok(SearchResponse {
            hits,
            nb_hits,
            page,
            nb_pages: nb_pages(nb_hits, hits_per_page as u64),
            hits_per_page,
            exhaustive_nb_hits: true,
            exhaustive_type: true,
            exhaustive: Exhaustive {
                nb_hits: true,
                typo: true,
            },
            params: format!(
                "query={}&hitsPerPage={}&page={}",
                urlencoding::encode(&params.query),
                hits_per_page,
                page
            ),
            query: params.query.clone(),
            index,
            processing_time_ms: elapsed,
            processing_timings_ms: ProcessingTimings {
                request: RoundTrip { round_trip: elapsed },
            },
            server_time_ms: took,
        })
    }

    /// Compile, dispatch and reshape; returns `(hits, nb_hits, took)`
    async fn execute(&self, data: &QueryData) -> Result<(Vec<Map<String, Value>>, u64, u64), SearchError> {
        let config = self.registry.config_for_index(&data.index)?;
        let compiled = compile_query(data, config, &self.compile_options()?)?;
        let body = ElasticTranslator::request_body(&compiled);

        let backend = self.backend()?;
        debug!(index = %data.index, backend = backend.name(), "Dispatching search");
        let response = backend.search(&compiled.index, &body).await?;

        let nb_hits = response.total_hits();
        let hits = response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                reshape_hit(
                    hit,
                    &compiled.snippet_field,
                    compiled.highlight_field.as_deref(),
                    &config.private_fields,
                )
            })
            .collect();
        Ok((hits, nb_hits, response.took))
    }

    /// Type-ahead search across several collections in one backend request
    pub async fn run_multi_query(&self, data: &MultiQueryData) -> Result<MultiSearchResponse, SearchError> {
        let timer = QueryTimer::new("multi");
        let indexes: Vec<String> = data
            .indexes
            .iter()
            .map(|i| self.config.strip_index_prefix(i).to_string())
            .collect();
        let data = MultiQueryData {
            indexes,
            ..data.clone()
        };

        let result = self.execute_multi(&data).await;
        metrics::record_query("multi", if result.is_ok() { "success" } else { "error" });
        let (hits, nb_hits) = result?;
        metrics::record_results(hits.len());

        Ok(MultiSearchResponse {
            hits,
            nb_hits,
            query: data.search,
            indexes: data.indexes,
            processing_time_ms: timer.elapsed_ms(),
        })
    }

    async fn execute_multi(&self, data: &MultiQueryData) -> Result<(Vec<Map<String, Value>>, u64), SearchError> {
        let compiled = compile_multi_query(data, &self.registry)?;
        let body = ElasticTranslator::multi_request_body(&compiled);
        let backend = self.backend()?;
        let response = backend.search(&compiled.indexes.join(","), &body).await?;

        let nb_hits = response.total_hits();
        let hits = response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let index = resolve_index(&compiled.indexes, &hit.index)
                    .map(str::to_string)
                    .unwrap_or_else(|| hit.index.clone());
                let mut source = hit.source;
                for field in &compiled.source_excludes {
                    source.remove(field);
                }
                source.insert("_id".into(), Value::String(hit.id));
                source.insert("_index".into(), Value::String(index));
                source
            })
            .collect();
        Ok((hits, nb_hits))
    }
}

/// Reshape a raw hit into the client hit shape
pub fn reshape_hit(
    hit: RawHit,
    snippet_field: &str,
    highlight_field: Option<&str>,
    private_fields: &[String],
) -> Map<String, Value> {
    let fragment = |field: &str| hit.highlight.get(field).and_then(|f| f.first()).map(String::as_str);
    let snippet = HighlightValue::from_fragment(fragment(snippet_field));
    let highlight = HighlightValue::from_fragment(highlight_field.and_then(fragment));

    let mut out = hit.source;
    for field in private_fields {
        out.remove(field);
    }
    out.insert("_id".into(), Value::String(hit.id));
    out.insert("_snippetResult".into(), json!({ SNIPPET_RESULT_KEY: snippet }));
    out.insert("_highlightResult".into(), json!({ HIGHLIGHT_RESULT_KEY: highlight }));
    out
}
