//! Cache Module
//!
//! Provides the in-process LRU cache with lazy TTL expiry that sits in front
//! of the persistent engine.

mod entry;
mod lru;
mod stats;
mod ttl_cache;


use tokio::sync::Mutex;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruList;
pub use stats::{CacheEvent, CacheStats};
pub use ttl_cache::BoundedTtlCache;

// == Cache Mode ==
/// Whether the store keeps an in-process cache at all.
///
/// The cache sits behind a single mutex; every operation on it is
/// synchronous, so the guard is never held across engine I/O.
#[derive(Debug)]
pub enum CacheMode {
    Disabled,
    Enabled(Mutex<BoundedTtlCache>),
}

impl CacheMode {
    /// Capacity 0 disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            CacheMode::Disabled
        } else {
            CacheMode::Enabled(Mutex::new(BoundedTtlCache::new(capacity)))
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheMode::Enabled(_))
    }
}
