//! Per-URL response cache for the feed pages.
//!
//! Rendered `200 OK` pages are kept in an LRU map keyed by path, query and
//! session cookie. Entries expire after a fixed TTL and are otherwise only
//! dropped by an explicit clear from the admin listener:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 20
//! response_limit = 200
//! ```

mod config;
mod keys;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use keys::{ResponseKey, hash_query, hash_value};
pub use middleware::{CacheState, response_cache_layer};
pub use store::{CachedResponse, ResponseStore};
