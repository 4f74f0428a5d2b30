//! Client-side search proxy.

mod proxy;
mod request_cache;
mod transport;

pub use proxy::SearchClient;
pub use request_cache::{RequestCache, RequestCacheStats};
pub use transport::{ClientError, HttpTransport, Transport};
