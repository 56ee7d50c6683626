//! Response cache for read-mostly catalog data.
//!
//! Page renders read the collection list and per-collection detail on
//! nearly every request. Entries carry their own TTL and are evicted lazily;
//! concurrent misses for one key can be coalesced so only one request
//! reaches the backend.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! collections_ttl_seconds = 3600
//! collection_detail_ttl_seconds = 600
//! navigation_ttl_seconds = 600
//! navigation_preload_limit = 6
//! single_flight = true
//! ```

mod config;
mod flight;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub(crate) use config::{
    DEFAULT_COLLECTION_DETAIL_TTL_SECS, DEFAULT_COLLECTIONS_TTL_SECS,
    DEFAULT_NAVIGATION_PRELOAD_LIMIT, DEFAULT_NAVIGATION_TTL_SECS,
};
pub(crate) use flight::{Flight, Flights};
pub use keys::CacheKey;
pub(crate) use lock::{rw_read, rw_write};
pub use store::{MemoryCache, ResponseCache};
pub(crate) use store::{METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
