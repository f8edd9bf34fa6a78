//! In-process engine keeping buckets in ordered maps.
//!
//! Used for ephemeral stores and tests; it honours the same transactional
//! contract as the LMDB engine since every call holds the lock for its
//! whole duration.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::KvEngine;
use crate::error::{Result, StoreError};

type Buckets = HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>;

#[derive(Debug, Default)]
pub struct MemoryEngine {
    buckets: RwLock<Buckets>,
    writes: AtomicU64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed puts since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn poisoned() -> StoreError {
        StoreError::Engine("memory engine lock poisoned".to_string())
    }
}

impl KvEngine for MemoryEngine {
    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let mut buckets = self.buckets.write().map_err(|_| Self::poisoned())?;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let buckets = self.buckets.read().map_err(|_| Self::poisoned())?;
        Ok(buckets.get(bucket).and_then(|b| b.get(key)).cloned())
    }

    fn delete(&self, bucket: &str, key: &[u8]) -> Result<()> {
        let mut buckets = self.buckets.write().map_err(|_| Self::poisoned())?;
        if let Some(b) = buckets.get_mut(bucket) {
            b.remove(key);
        }
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.buckets.write().map_err(|_| Self::poisoned())?;
        buckets.remove(bucket);
        Ok(())
    }
}
