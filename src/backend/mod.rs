//! Search backends.
//!
//! [`SearchBackend`] is the one primitive the gateway needs from a cluster:
//! `search(index, body) -> raw response`.

pub mod elastic;
pub mod memory;
pub mod traits;

pub use elastic::ElasticBackend;
pub use memory::InMemoryBackend;
pub use traits::{BackendError, RawHit, RawHits, RawSearchResponse, SearchBackend, TotalHits};
