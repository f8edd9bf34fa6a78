//! Retrying persistent store.
//!
//! Wraps a `KvEngine` with bounded write retries, record framing and expiry
//! classification. Engine calls run on the blocking pool.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{expiry_from_ttl, KvEngine, Record};
use crate::cache::current_timestamp_ms;
use crate::error::{Result, StoreError};

/// Namespaced record access with bounded write retries.
#[derive(Clone)]
pub struct RetryingStore {
    engine: Arc<dyn KvEngine>,
    attempts: u8,
}

impl std::fmt::Debug for RetryingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingStore")
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl RetryingStore {
    /// `attempts` is clamped to at least one.
    pub fn new(engine: Arc<dyn KvEngine>, attempts: u8) -> Self {
        Self {
            engine,
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    // == Put ==
    /// Writes `value` with an optional TTL in seconds (0 = never expires).
    ///
    /// Retries immediately on failure, stopping at the first success. When
    /// every attempt fails the last engine error is returned as
    /// `StoreError::WriteFailed` carrying the key. Returns the record that
    /// was committed.
    pub async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<Record> {
        let record = Record::new(value, expiry_from_ttl(ttl_secs, current_timestamp_ms()));
        let buf = record.encode()?;
        let attempts = self.attempts;
        let namespace = namespace.to_string();
        let key = key.to_string();

        self.blocking(move |engine| {
            let mut last_error = None;
            for attempt in 1..=attempts {
                match engine.put(&namespace, key.as_bytes(), &buf) {
                    Ok(()) => {
                        if attempt > 1 {
                            debug!(%namespace, %key, attempt, "write succeeded after retry");
                        }
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(%namespace, %key, attempt, error = %e, "write attempt failed");
                        last_error = Some(e);
                    }
                }
            }
            Err(StoreError::WriteFailed {
                key,
                reason: last_error.map(failure_reason).unwrap_or_default(),
            })
        })
        .await?;

        Ok(record)
    }

    // == Get ==
    /// Reads a live record in one read transaction.
    ///
    /// Returns `NotFound` for an absent namespace or key and `Expired` when
    /// the record's expiry has passed. Expired records stay on disk until
    /// deleted.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Record> {
        let owned_ns = namespace.to_string();
        let owned_key = key.to_string();
        let raw = self
            .blocking(move |engine| engine.get(&owned_ns, owned_key.as_bytes()))
            .await?;

        let Some(raw) = raw else {
            return Err(StoreError::NotFound(key.to_string()));
        };
        let record = Record::decode(&raw)?;
        if record.is_expired_at(current_timestamp_ms()) {
            return Err(StoreError::Expired(key.to_string()));
        }
        Ok(record)
    }

    // == Delete ==
    /// Removes one record; absent records are not an error.
    pub async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let namespace = namespace.to_string();
        let key = key.to_string();
        self.blocking(move |engine| engine.delete(&namespace, key.as_bytes()))
            .await
    }

    /// Removes every record of a namespace; absent namespaces are not an error.
    pub async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        let namespace = namespace.to_string();
        self.blocking(move |engine| engine.delete_bucket(&namespace))
            .await
    }

    pub async fn flush(&self) -> Result<()> {
        self.blocking(|engine| engine.flush()).await
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KvEngine) -> Result<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || op(engine.as_ref()))
            .await
            .map_err(|e| StoreError::Engine(format!("engine task failed: {e}")))?
    }
}

fn failure_reason(err: StoreError) -> String {
    match err {
        StoreError::Engine(reason) => reason,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryEngine;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` puts, then delegates.
    struct Flaky {
        inner: MemoryEngine,
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryEngine::new(),
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl KvEngine for Flaky {
        fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(StoreError::Engine(format!("transient failure {call}")));
            }
            self.inner.put(bucket, key, value)
        }
        fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
            self.inner.get(bucket, key)
        }
        fn delete(&self, bucket: &str, key: &[u8]) -> Result<()> {
            self.inner.delete(bucket, key)
        }
        fn delete_bucket(&self, bucket: &str) -> Result<()> {
            self.inner.delete_bucket(bucket)
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = RetryingStore::new(Arc::new(MemoryEngine::new()), 3);

        store.put("ns", "k", b"v".to_vec(), 0).await.unwrap();

        let record = store.get("ns", "k").await.unwrap();
        assert_eq!(record.value, b"v");
        assert_eq!(record.expires_at, None);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = RetryingStore::new(Arc::new(MemoryEngine::new()), 3);

        let err = store.get("ns", "k").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("k".to_string()));
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let engine = Arc::new(Flaky::new(2));
        let store = RetryingStore::new(engine.clone(), 3);

        store.put("ns", "k", b"v".to_vec(), 0).await.unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.get("ns", "k").await.unwrap().value, b"v");
    }

    #[tokio::test]
    async fn test_retry_exhausted_reports_key() {
        let engine = Arc::new(Flaky::new(10));
        let store = RetryingStore::new(engine.clone(), 3);

        let err = store.put("ns", "user:7", b"v".to_vec(), 0).await.unwrap_err();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        match err {
            StoreError::WriteFailed { key, reason } => {
                assert_eq!(key, "user:7");
                assert_eq!(reason, "transient failure 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_still_writes_once() {
        let store = RetryingStore::new(Arc::new(MemoryEngine::new()), 0);
        assert_eq!(store.attempts(), 1);
        store.put("ns", "k", b"v".to_vec(), 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_is_distinct_from_missing() {
        let engine = Arc::new(MemoryEngine::new());
        let store = RetryingStore::new(engine.clone(), 3);

        let stale = Record::new(b"v".to_vec(), Some(1)).encode().unwrap();
        engine.put("ns", b"old", &stale).unwrap();

        let err = store.get("ns", "old").await.unwrap_err();
        assert_eq!(err, StoreError::Expired("old".to_string()));
        // Still physically present
        assert!(engine.get("ns", b"old").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_with_ttl_sets_expiry() {
        let store = RetryingStore::new(Arc::new(MemoryEngine::new()), 3);
        let before = current_timestamp_ms() / 1000;

        let record = store.put("ns", "k", b"v".to_vec(), 60).await.unwrap();

        let expires = record.expires_at.unwrap();
        assert!(expires >= before + 60);
        assert!(expires <= before + 62);
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let store = RetryingStore::new(Arc::new(MemoryEngine::new()), 3);

        store.put("ns", "a", b"1".to_vec(), 0).await.unwrap();
        store.put("other", "a", b"2".to_vec(), 0).await.unwrap();
        store.delete_namespace("ns").await.unwrap();
        store.delete_namespace("ns").await.unwrap();

        assert!(matches!(store.get("ns", "a").await, Err(StoreError::NotFound(_))));
        assert!(store.get("other", "a").await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_bad_value() {
        let engine = Arc::new(MemoryEngine::new());
        let store = RetryingStore::new(engine.clone(), 3);
        engine.put("ns", b"k", b"xx").unwrap();

        assert!(matches!(store.get("ns", "k").await, Err(StoreError::BadValue(_))));
    }
}
