//! Cache Statistics Module
//!
//! Counters kept by the bounded cache and the snapshot handed to callers.

use serde::Serialize;

/// Something the cache observed while serving a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Hit,
    /// Lookup fell through: key absent or expired.
    Miss,
    /// Least recently used entry dropped to make room.
    Eviction,
    /// Entry dropped on access because its expiry had passed.
    Expiration,
}

// == Cache Stats ==
/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Resident entries when the snapshot was taken
    pub total_entries: usize,
    /// Maximum resident entries
    pub capacity: usize,
}

impl CacheStats {
    /// Zeroed counters for a cache bounded at `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn record(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::Hit => self.hits += 1,
            CacheEvent::Miss => self.misses += 1,
            CacheEvent::Eviction => self.evictions += 1,
            CacheEvent::Expiration => self.expirations += 1,
        }
    }

    /// Copy of the counters with the given resident count.
    pub fn snapshot(&self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self.clone()
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Fraction of capacity in use; 0.0 for a zero-capacity cache.
    pub fn occupancy(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.total_entries as f64 / self.capacity as f64
        }
    }
}
