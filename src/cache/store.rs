//! In-memory LRU store for rendered responses.

use std::{
    sync::RwLock,
    time::{Duration, Instant},
};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::{
    CacheConfig,
    keys::ResponseKey,
    lock::{rw_read, rw_write},
};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

pub struct ResponseStore {
    ttl: Duration,
    responses: RwLock<LruCache<ResponseKey, Entry>>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            responses: RwLock::new(LruCache::new(config.response_limit_non_zero())),
        }
    }

    /// Fetch a live entry; expired entries are dropped and reported as misses.
    pub fn get(&self, key: &ResponseKey) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &ResponseKey, now: Instant) -> Option<CachedResponse> {
        let mut responses = rw_write(&self.responses, SOURCE, "get");
        let expired = match responses.get(key) {
            Some(entry) if now.saturating_duration_since(entry.stored_at) < self.ttl => {
                counter!("yatube_cache_hit_total").increment(1);
                return Some(entry.response.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            responses.pop(key);
        }
        counter!("yatube_cache_miss_total").increment(1);
        None
    }

    pub fn set(&self, key: ResponseKey, response: CachedResponse) {
        let entry = Entry {
            response,
            stored_at: Instant::now(),
        };
        let evicted = rw_write(&self.responses, SOURCE, "set").push(key.clone(), entry);
        if matches!(evicted, Some((evicted_key, _)) if evicted_key != key) {
            counter!("yatube_cache_evict_total").increment(1);
        }
    }

    /// Drop every entry; returns how many were removed.
    pub fn invalidate_all(&self) -> usize {
        let mut responses = rw_write(&self.responses, SOURCE, "invalidate_all");
        let removed = responses.len();
        responses.clear();
        counter!("yatube_cache_clear_total").increment(1);
        removed
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
