//! Cache key definitions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Identifies one cached page.
///
/// Entries are partitioned by the caller's session cookie so a page rendered
/// for one visitor is never replayed to another; anonymous visitors share the
/// `None` partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub session: Option<u64>,
    pub path: String,
    pub query_hash: u64,
}

impl ResponseKey {
    pub fn new(session_token: Option<&str>, path: &str, query: &str) -> Self {
        Self {
            session: session_token.map(|token| hash_value(&token)),
            path: path.to_string(),
            query_hash: hash_query(query),
        }
    }
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a query string for response key generation.
pub fn hash_query(query: &str) -> u64 {
    hash_value(&query)
}
