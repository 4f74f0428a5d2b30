//! Search execution and the wire contract.

mod execution;
mod wire;

pub use execution::{nb_pages, reshape_hit, SearchService, HIGHLIGHT_RESULT_KEY, SNIPPET_RESULT_KEY};
pub use wire::{
    parse_batch, validate_batch, Exhaustive, HighlightValue, MultiSearchResponse, ProcessingTimings, RoundTrip,
    SearchResponse, ValidationError, WireSearchParams, WireSearchQuery,
};
