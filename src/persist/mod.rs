//! Persistence Module
//!
//! The embedded key-value engine seam, its LMDB and in-memory bindings, the
//! stored record layout and the retrying adapter the record store talks to.

mod lmdb;
mod memory;
mod record;
mod retrying;

pub use lmdb::LmdbEngine;
pub use memory::MemoryEngine;
pub use record::{expiry_from_ttl, Record};
pub use retrying::RetryingStore;

use crate::error::Result;

// == Engine Trait ==
/// Transactional bucketed key-value engine.
///
/// Each call is one all-or-nothing transaction. Writes create the bucket on
/// demand; reads and deletes treat a missing bucket as empty.
pub trait KvEngine: Send + Sync + 'static {
    /// Stores `value` under `key` in `bucket`, creating the bucket if needed.
    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()>;

    /// Reads `key` from `bucket`; `None` when either is absent.
    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Removes `key` from `bucket`. Absent keys and buckets are not errors.
    fn delete(&self, bucket: &str, key: &[u8]) -> Result<()>;

    /// Drops every key in `bucket`. An absent bucket is not an error.
    fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Flushes pending writes to durable storage.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
