//! Response cache.
//!
//! In-memory cache mapping request path (+ query) to a previously computed
//! JSON response, with a declarative invalidation table consulted by every
//! mutating handler. Entries have no TTL; they live until invalidated.

mod lock;
pub mod middleware;
mod registry;
mod store;

pub use middleware::cache_middleware;
pub use registry::Resource;
pub use store::{CachedResponse, ResponseCache};
