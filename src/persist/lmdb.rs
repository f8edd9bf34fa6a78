//! LMDB-backed engine.
//!
//! Uses the heed crate. Every namespace is a named LMDB database inside one
//! environment, created lazily by the first write to it.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use tracing::info;

use super::KvEngine;
use crate::error::{Result, StoreError};

/// Upper bound on the number of namespaces in one environment.
const MAX_BUCKETS: u32 = 128;

type Bucket = Database<Bytes, Bytes>;

/// LMDB environment holding one database per namespace.
#[derive(Clone)]
pub struct LmdbEngine {
    env: Env,
    read_only: bool,
}

impl std::fmt::Debug for LmdbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbEngine")
            .field("path", &self.env.path())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl LmdbEngine {
    /// Opens (or creates) the environment at `path`.
    ///
    /// Writes are not synced on commit; `flush` forces them to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if the directory cannot be created or
    /// the environment cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool, map_size_mb: usize) -> Result<Self> {
        let path = path.as_ref();
        if !read_only {
            std::fs::create_dir_all(path).map_err(|e| {
                StoreError::Engine(format!("cannot create {}: {e}", path.display()))
            })?;
        }

        let mut flags = EnvFlags::NO_SYNC;
        if read_only {
            flags |= EnvFlags::READ_ONLY;
        }

        let mut options = EnvOpenOptions::new();
        options
            .map_size(map_size_mb.max(1) * 1024 * 1024)
            .max_dbs(MAX_BUCKETS);

        // SAFETY: the environment is opened once per path by this process and
        // NO_SYNC only trades durability of the last commits for speed.
        let env = unsafe {
            options.flags(flags);
            options.open(path)
        }?;

        info!(path = %path.display(), read_only, "LMDB environment opened");
        Ok(Self { env, read_only })
    }
}

impl KvEngine for LmdbEngine {
    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: Bucket = self.env.create_database(&mut wtxn, Some(bucket))?;
        db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        let Some(db) = self.env.open_database::<Bytes, Bytes>(&rtxn, Some(bucket))? else {
            return Ok(None);
        };
        Ok(db.get(&rtxn, key)?.map(|v| v.to_vec()))
    }

    fn delete(&self, bucket: &str, key: &[u8]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        if let Some(db) = self.env.open_database::<Bytes, Bytes>(&wtxn, Some(bucket))? {
            db.delete(&mut wtxn, key)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        if let Some(db) = self.env.open_database::<Bytes, Bytes>(&wtxn, Some(bucket))? {
            db.clear(&mut wtxn)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if !self.read_only {
            self.env.force_sync()?;
        }
        Ok(())
    }
}
