//! Record Store Module
//!
//! The public facade. Reads go to the in-process cache first and fall back to
//! the persistent engine; writes persist first and only then fill the cache;
//! `memoize` coalesces concurrent recomputation of a missing key.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, BoundedTtlCache, CacheMode, CacheStats};
use crate::coalesce::CoalescingLoader;
use crate::codec::Codec;
use crate::config::StoreOptions;
use crate::error::{Result, StoreError};
use crate::persist::{KvEngine, LmdbEngine, MemoryEngine, Record, RetryingStore};

/// Namespace used by the key-only operations.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Longest key LMDB accepts with its default build.
pub const MAX_KEY_LENGTH: usize = 511;

// == Record Store ==
/// Cached, memoizing access to a persistent key-value engine.
///
/// Share one instance between tasks behind an `Arc`.
#[derive(Debug)]
pub struct RecordStore {
    persist: RetryingStore,
    cache: CacheMode,
    loader: CoalescingLoader<Vec<u8>>,
}

impl RecordStore {
    // == Constructors ==
    /// Opens an LMDB-backed store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if the environment cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let engine = LmdbEngine::open(path, options.read_only, options.map_size_mb)?;
        Ok(Self::with_engine(Arc::new(engine), options))
    }

    /// Builds a store over any engine.
    pub fn with_engine(engine: Arc<dyn KvEngine>, options: StoreOptions) -> Self {
        let persist = RetryingStore::new(engine, options.effective_retries());
        let cache = CacheMode::with_capacity(options.cache_capacity);
        info!(
            retries = persist.attempts(),
            cache_capacity = options.cache_capacity,
            read_only = options.read_only,
            cache_enabled = cache.is_enabled(),
            "record store ready"
        );
        Self {
            persist,
            cache,
            loader: CoalescingLoader::new(),
        }
    }

    /// Builds a store over a fresh in-memory engine.
    pub fn in_memory(options: StoreOptions) -> Self {
        Self::with_engine(Arc::new(MemoryEngine::new()), options)
    }

    /// Flushes the engine and releases the store.
    pub async fn close(self) -> Result<()> {
        self.persist.flush().await?;
        info!("record store closed");
        Ok(())
    }

    /// Cache statistics, `None` when caching is disabled.
    pub async fn stats(&self) -> Option<CacheStats> {
        match &self.cache {
            CacheMode::Disabled => None,
            CacheMode::Enabled(cache) => Some(cache.lock().await.stats()),
        }
    }

    // == Namespaced Operations ==
    /// Stores raw bytes that never expire.
    pub async fn put(&self, namespace: &str, key: &str, value: &[u8]) -> Result<()> {
        self.put_with_ttl(namespace, key, value, 0).await
    }

    /// Stores raw bytes expiring after `ttl_secs` seconds (0 = never).
    pub async fn put_with_ttl(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<()> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        self.persist
            .put(namespace, key, value.to_vec(), ttl_secs)
            .await?;
        if namespace == DEFAULT_NAMESPACE {
            self.cache_invalidate(key).await;
        }
        Ok(())
    }

    /// Reads raw bytes, bypassing the cache.
    ///
    /// Returns `NotFound` for an absent namespace or key and `Expired` for a
    /// record whose TTL has elapsed.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Vec<u8>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        Ok(self.persist.get(namespace, key).await?.value)
    }

    /// Deletes one record; deleting something absent is not an error.
    pub async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        self.persist.delete(namespace, key).await?;
        if namespace == DEFAULT_NAMESPACE {
            self.cache_invalidate(key).await;
        }
        Ok(())
    }

    /// Deletes a whole namespace; an absent namespace is not an error.
    pub async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        validate_namespace(namespace)?;
        self.persist.delete_namespace(namespace).await?;
        if namespace == DEFAULT_NAMESPACE {
            if let CacheMode::Enabled(cache) = &self.cache {
                cache.lock().await.invalidate_all();
            }
        }
        Ok(())
    }

    // == Update ==
    /// Encodes and persists `value` in the default namespace without expiry.
    pub async fn update<V: Codec>(&self, key: &str, value: &V) -> Result<()> {
        self.update_with_ttl(key, value, 0).await
    }

    /// Encodes and persists `value`, then caches it with the same expiry.
    ///
    /// The cache is only filled after the write has succeeded.
    pub async fn update_with_ttl<V: Codec>(&self, key: &str, value: &V, ttl_secs: u64) -> Result<()> {
        validate_key(key)?;
        let bytes = value.encode()?;
        self.persist_and_cache(key, bytes, ttl_secs).await?;
        Ok(())
    }

    // == Load ==
    /// Reads and decodes the value stored under `key`.
    ///
    /// A cache hit never touches the engine. On a miss the engine is read
    /// and a live record refills the cache.
    pub async fn load<V: Codec>(&self, key: &str) -> Result<V> {
        validate_key(key)?;
        let bytes = self.load_bytes(key).await?;
        V::decode(&bytes)
    }

    // == Remove ==
    /// Drops `key` from the cache and deletes it from the default namespace.
    ///
    /// Only the engine deletion can fail the call.
    pub async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.cache_invalidate(key).await;
        let deleted = self.persist.delete(DEFAULT_NAMESPACE, key).await;
        // Voids reads that started between the first invalidation and the delete
        self.cache_invalidate(key).await;
        deleted
    }

    // == Memoize ==
    /// Loads `key`, computing and storing it when missing or expired.
    pub async fn memoize<V, F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        V: Codec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        self.memoize_with_ttl(key, compute, 0).await
    }

    /// Loads `key`, computing and storing it with a TTL when missing or expired.
    ///
    /// Concurrent callers missing on the same key share a single run of
    /// `compute` and a single write; all of them get the same value. Any
    /// load failure other than `NotFound`/`Expired` is returned without
    /// running `compute`. A failed computation stores nothing.
    pub async fn memoize_with_ttl<V, F, Fut>(&self, key: &str, compute: F, ttl_secs: u64) -> Result<V>
    where
        V: Codec,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        validate_key(key)?;
        match self.load_bytes(key).await {
            Ok(bytes) => return V::decode(&bytes),
            Err(e) if !e.is_miss() => return Err(e),
            Err(_) => {}
        }

        let bytes = self
            .loader
            .run(key, move || async move {
                // A burst that ended between our miss and this claim has
                // already stored the value.
                match self.load_bytes(key).await {
                    Ok(bytes) => return Ok(bytes),
                    Err(e) if !e.is_miss() => return Err(e),
                    Err(_) => {}
                }

                debug!(key, "computing memoized value");
                let value = compute()
                    .await
                    .map_err(|e| StoreError::Compute(format!("{e:#}")))?;
                let bytes = value.encode()?;
                let record = self.persist_and_cache(key, bytes, ttl_secs).await?;
                Ok(record.value)
            })
            .await?;

        V::decode(&bytes)
    }

    // == Internals ==
    async fn load_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let ticket = match &self.cache {
            CacheMode::Enabled(cache) => {
                let mut cache = cache.lock().await;
                if let Some(bytes) = cache.get(key) {
                    return Ok(bytes);
                }
                cache.generation()
            }
            CacheMode::Disabled => 0,
        };

        let record = self.persist.get(DEFAULT_NAMESPACE, key).await?;
        if let Some((cache, expires_at)) = self.cacheable(key, &record) {
            cache
                .lock()
                .await
                .fill(key, ticket, expires_at, record.value.clone());
        }
        Ok(record.value)
    }

    async fn persist_and_cache(&self, key: &str, bytes: Vec<u8>, ttl_secs: u64) -> Result<Record> {
        let ticket = self.cache_generation().await;
        let record = self
            .persist
            .put(DEFAULT_NAMESPACE, key, bytes, ttl_secs)
            .await?;
        match self.cacheable(key, &record) {
            Some((cache, expires_at)) => {
                cache
                    .lock()
                    .await
                    .write_through(key, ticket, expires_at, record.value.clone());
            }
            None => self.cache_invalidate(key).await,
        }
        Ok(record)
    }

    /// The cache and stored expiry for `record`, or `None` when caching is
    /// off or the record's expiry has already passed.
    fn cacheable(&self, key: &str, record: &Record) -> Option<(&Mutex<BoundedTtlCache>, Option<u64>)> {
        let CacheMode::Enabled(cache) = &self.cache else {
            return None;
        };
        let expires_at = record.expires_at_ms();
        if expires_at.is_some_and(|at| at <= current_timestamp_ms()) {
            debug!(key, "skipping cache fill for record at end of life");
            return None;
        }
        Some((cache, expires_at))
    }

    async fn cache_generation(&self) -> u64 {
        match &self.cache {
            CacheMode::Enabled(cache) => cache.lock().await.generation(),
            CacheMode::Disabled => 0,
        }
    }

    async fn cache_invalidate(&self, key: &str) {
        if let CacheMode::Enabled(cache) = &self.cache {
            cache.lock().await.invalidate(key);
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::BadValue("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::BadValue(format!(
            "key exceeds maximum length of {MAX_KEY_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(StoreError::BadValue("namespace cannot be empty".to_string()));
    }
    Ok(())
}
