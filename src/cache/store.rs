//! Cache storage.
//!
//! [`ResponseCache`] is the seam page code depends on; [`MemoryCache`] is
//! the in-process implementation. Values are opaque bytes so a shared
//! out-of-process store can be dropped in without touching callers.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use tokio::time::Instant;
use tracing::trace;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "hadith_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "hadith_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "hadith_cache_expired_total";

/// Key/value store with per-entry time-to-live.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the stored value while it is fresh; stale entries read as
    /// absent.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores or overwrites a value, stamping the current time.
    async fn set(&self, key: &str, data: Bytes, ttl: Duration);

    /// Drops every entry.
    async fn clear(&self);
}

/// One stored value. Never handed out; readers get a clone of `data`.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Bytes,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

/// Process-local [`ResponseCache`].
///
/// Expired entries are removed lazily by the read that finds them; nothing
/// sweeps the map in the background.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_if_stale(&self, key: &str, now: Instant) {
        let mut entries = rw_write(&self.entries, SOURCE, "evict");
        // A writer may have refreshed the entry between our read and write.
        if entries.get(key).is_some_and(|entry| !entry.is_fresh(now)) {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let stale = {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    return Some(entry.data.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            trace!(key, "evicting expired cache entry");
            counter!(METRIC_CACHE_EXPIRED).increment(1);
            self.evict_if_stale(key, now);
        }
        counter!(METRIC_CACHE_MISS).increment(1);
        None
    }

    async fn set(&self, key: &str, data: Bytes, ttl: Duration) {
        let entry = CacheEntry {
            data,
            created_at: Instant::now(),
            ttl,
        };
        rw_write(&self.entries, SOURCE, "set").insert(key.to_string(), entry);
    }

    async fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}
