//! Cache configuration.
//!
//! Controls per-read TTLs, sidebar preloading, and miss coalescing via the
//! `[cache]` table of `hadith.toml`.

use std::time::Duration;

pub(crate) const DEFAULT_COLLECTIONS_TTL_SECS: u64 = 60 * 60;
pub(crate) const DEFAULT_COLLECTION_DETAIL_TTL_SECS: u64 = 10 * 60;
pub(crate) const DEFAULT_NAVIGATION_TTL_SECS: u64 = 10 * 60;
pub(crate) const DEFAULT_NAVIGATION_PRELOAD_LIMIT: usize = 6;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL of the full collection list.
    pub collections_ttl: Duration,
    /// TTL of a single collection with its books.
    pub collection_detail_ttl: Duration,
    /// TTL of the sidebar collection list.
    pub navigation_ttl: Duration,
    /// Number of leading collections whose books are fetched up front for
    /// the sidebar. The rest are loaded on expansion.
    pub navigation_preload_limit: usize,
    /// Coalesce concurrent misses for the same key into one backend call.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collections_ttl: Duration::from_secs(DEFAULT_COLLECTIONS_TTL_SECS),
            collection_detail_ttl: Duration::from_secs(DEFAULT_COLLECTION_DETAIL_TTL_SECS),
            navigation_ttl: Duration::from_secs(DEFAULT_NAVIGATION_TTL_SECS),
            navigation_preload_limit: DEFAULT_NAVIGATION_PRELOAD_LIMIT,
            single_flight: true,
        }
    }
}
