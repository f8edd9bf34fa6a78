//! Bounded TTL Cache Module
//!
//! Fixed-capacity LRU keyed by string where each entry may carry an absolute
//! expiry. Expiry is checked lazily on access; nothing scans for stale entries.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheEvent, CacheStats, LruList};

// == Bounded TTL Cache ==
/// LRU cache with lazy per-entry expiry.
///
/// `index` and `order` always hold the same key set and
/// `order.len() <= capacity`.
///
/// `generation` advances on every write-side change. A caller that reads the
/// backing store on a miss takes the generation first and may only fill the
/// cache if it is unchanged, so a value read before a concurrent write or
/// removal is never cached after it.
#[derive(Debug)]
pub struct BoundedTtlCache {
    /// Key to slot in `order`
    index: HashMap<String, usize>,
    /// Recency-ordered entries
    order: LruList<CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of resident entries
    capacity: usize,
    /// Count of write-side changes
    generation: u64,
}

impl BoundedTtlCache {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is represented by `CacheMode::Disabled` rather than
    /// by an instance of this type; an instance built with zero keeps
    /// nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            order: LruList::with_capacity(capacity),
            stats: CacheStats::with_capacity(capacity),
            capacity,
            generation: 0,
        }
    }

    // == Put ==
    /// Inserts or replaces `key`, making it the most recently used entry.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry, the
    /// least recently used one.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `expires_at` - Optional absolute expiry in Unix milliseconds
    /// * `value` - The encoded value
    pub fn put(&mut self, key: &str, expires_at: Option<u64>, value: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&idx) = self.index.get(key) {
            if let Some(entry) = self.order.get_mut(idx) {
                *entry = CacheEntry::new(value, expires_at);
            }
            self.order.move_to_front(idx);
            return;
        }

        if self.order.len() >= self.capacity {
            if let Some((evicted, _)) = self.order.pop_back() {
                self.index.remove(&evicted);
                self.stats.record(CacheEvent::Eviction);
                debug!(key = %evicted, "cache eviction");
            }
        }

        let idx = self
            .order
            .push_front(key.to_string(), CacheEntry::new(value, expires_at));
        self.index.insert(key.to_string(), idx);
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        self.get_at(key, current_timestamp_ms())
    }

    /// Same as `get` with an explicit clock reading in Unix milliseconds.
    pub fn get_at(&mut self, key: &str, now_ms: u64) -> Option<Vec<u8>> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.record(CacheEvent::Miss);
            return None;
        };

        let expired = match self.order.get(idx) {
            Some(entry) => entry.is_expired_at(now_ms),
            None => true,
        };
        if expired {
            self.index.remove(key);
            self.order.remove(idx);
            self.stats.record(CacheEvent::Expiration);
            self.stats.record(CacheEvent::Miss);
            debug!(key = %key, "cache entry expired");
            return None;
        }

        self.order.move_to_front(idx);
        self.stats.record(CacheEvent::Hit);
        self.order.get(idx).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes `key` if present; absent keys are a no-op.
    pub fn delete(&mut self, key: &str) {
        if let Some(idx) = self.index.remove(key) {
            self.order.remove(idx);
        }
    }

    /// Drops every resident entry, keeping counters.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order = LruList::with_capacity(self.capacity);
    }

    // == Generations ==
    /// Ticket for a backing-store read about to start.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Caches a value read under `ticket`, unless a write-side change
    /// happened since. Returns whether the value was cached.
    pub fn fill(&mut self, key: &str, ticket: u64, expires_at: Option<u64>, value: Vec<u8>) -> bool {
        if ticket != self.generation {
            debug!(key = %key, "skipping fill from superseded read");
            return false;
        }
        self.put(key, expires_at, value);
        true
    }

    /// Records a value just written to the backing store.
    ///
    /// If another write-side change landed between `ticket` and now, the
    /// order of the two writes is unknown and the key is dropped instead.
    pub fn write_through(&mut self, key: &str, ticket: u64, expires_at: Option<u64>, value: Vec<u8>) {
        if ticket == self.generation {
            self.put(key, expires_at, value);
        } else {
            self.delete(key);
        }
        self.generation += 1;
    }

    /// Drops `key` after a write-side change to it.
    pub fn invalidate(&mut self, key: &str) {
        self.delete(key);
        self.generation += 1;
    }

    /// Drops every entry after a write-side change to the whole keyspace.
    pub fn invalidate_all(&mut self) {
        self.clear();
        self.generation += 1;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.order.len())
    }

    /// Resident keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        self.order.keys()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Returns the current number of resident entries.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.order.len());
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn val(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn test_cache_new() {
        let cache = BoundedTtlCache::new(100);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 100);
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = BoundedTtlCache::new(100);

        cache.put("key1", None, val("value1"));

        assert_eq!(cache.get("key1"), Some(val("value1")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let mut cache = BoundedTtlCache::new(100);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_delete() {
        let mut cache = BoundedTtlCache::new(100);

        cache.put("key1", None, val("value1"));
        cache.delete("key1");

        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_delete_nonexistent_is_noop() {
        let mut cache = BoundedTtlCache::new(100);
        cache.put("key1", None, val("value1"));

        cache.delete("nonexistent");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = BoundedTtlCache::new(100);

        cache.put("key1", None, val("value1"));
        cache.put("key1", None, val("value2"));

        assert_eq!(cache.get("key1"), Some(val("value2")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_replaces_expiry() {
        let mut cache = BoundedTtlCache::new(10);

        cache.put("key1", Some(1_000), val("old"));
        cache.put("key1", None, val("new"));

        assert_eq!(cache.get_at("key1", 5_000), Some(val("new")));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut cache = BoundedTtlCache::new(2);

        cache.put("a", None, val("1"));
        cache.put("b", None, val("2"));
        cache.put("a", None, val("3"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.keys(), vec!["a", "b"]);
    }

    #[test]
    fn test_capacity_two_scenario() {
        let mut cache = BoundedTtlCache::new(2);

        cache.put("k1", None, val("v1"));
        cache.put("k2", None, val("v2"));
        cache.put("k3", None, val("v3"));

        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2"), Some(val("v2")));
        assert_eq!(cache.get("k3"), Some(val("v3")));

        cache.delete("k2");
        assert_eq!(cache.get("k2"), None);
    }

    #[test]
    fn test_lru_touch_on_get() {
        let mut cache = BoundedTtlCache::new(2);

        cache.put("a", None, val("a"));
        cache.put("b", None, val("b"));
        cache.put("c", None, val("c"));
        // a evicted
        assert_eq!(cache.get("a"), None);

        // b becomes most recently used, so d evicts c
        cache.get("b");
        cache.put("d", None, val("d"));

        assert_eq!(cache.get("b"), Some(val("b")));
        assert_eq!(cache.get("c"), None);
        assert_eq!(cache.get("d"), Some(val("d")));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_lazy_expiry_removes_entry() {
        let mut cache = BoundedTtlCache::new(10);

        cache.put("short", Some(1_000), val("v"));
        cache.put("forever", None, val("v"));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get_at("short", 999), Some(val("v")));
        assert_eq!(cache.get_at("short", 1_000), None);

        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_no_expiry_survives_time() {
        let mut cache = BoundedTtlCache::new(10);
        cache.put("forever", None, val("v"));

        assert_eq!(cache.get_at("forever", u64::MAX), Some(val("v")));
    }

    #[test]
    fn test_expired_entry_not_touched_without_access() {
        let mut cache = BoundedTtlCache::new(10);
        cache.put("stale", Some(1), val("v"));

        // No access, no removal
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut cache = BoundedTtlCache::new(0);
        cache.put("k", None, val("v"));
        assert!(cache.is_empty());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear() {
        let mut cache = BoundedTtlCache::new(4);
        cache.put("a", None, val("1"));
        cache.put("b", None, val("2"));

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        cache.put("c", None, val("3"));
        assert_eq!(cache.keys(), vec!["c"]);
    }

    #[test]
    fn test_stats() {
        let mut cache = BoundedTtlCache::new(100);

        cache.put("key1", None, val("value1"));
        cache.get("key1"); // hit
        cache.get("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_fill_with_current_ticket() {
        let mut cache = BoundedTtlCache::new(4);
        let ticket = cache.generation();

        assert!(cache.fill("a", ticket, None, b"1".to_vec()));
        assert_eq!(cache.get("a"), Some(b"1".to_vec()));
    }

    #[test]
    fn test_fill_after_invalidate_is_skipped() {
        let mut cache = BoundedTtlCache::new(4);
        let ticket = cache.generation();

        cache.invalidate("a");

        assert!(!cache.fill("a", ticket, None, b"old".to_vec()));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_fill_after_write_through_keeps_written_value() {
        let mut cache = BoundedTtlCache::new(4);
        let read_ticket = cache.generation();

        let write_ticket = cache.generation();
        cache.write_through("a", write_ticket, None, b"new".to_vec());
        cache.fill("a", read_ticket, None, b"old".to_vec());

        assert_eq!(cache.get("a"), Some(b"new".to_vec()));
    }

    #[test]
    fn test_overlapping_write_through_drops_key() {
        let mut cache = BoundedTtlCache::new(4);
        let first = cache.generation();
        let second = cache.generation();

        cache.write_through("a", second, None, b"2".to_vec());
        cache.write_through("a", first, None, b"1".to_vec());

        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_invalidate_all_voids_tickets() {
        let mut cache = BoundedTtlCache::new(4);
        cache.put("a", None, b"1".to_vec());
        let ticket = cache.generation();

        cache.invalidate_all();

        assert!(cache.is_empty());
        assert!(!cache.fill("b", ticket, None, b"2".to_vec()));
    }
}
