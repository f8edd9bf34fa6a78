//! Request Coalescing Module
//!
//! Single-flight deduplication: while one caller (the leader) computes the
//! value for a key, every other caller asking for the same key waits for the
//! leader's result instead of computing it again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::error::Result;

/// What a finished in-flight entry hands to its waiters.
#[derive(Clone)]
enum Outcome<T> {
    Done(Result<T>),
    /// The leader went away before `compute` finished.
    Abandoned,
}

type Slot<T> = Option<Outcome<T>>;

/// One running computation and the callers parked on it.
struct Inflight<T> {
    result: watch::Sender<Slot<T>>,
    waiters: AtomicUsize,
}

enum InflightRole<T> {
    Leader(Arc<Inflight<T>>),
    Waiter(watch::Receiver<Slot<T>>),
}

// == Coalescing Loader ==
/// Runs at most one computation per key among overlapping callers.
///
/// Calls that do not overlap in time each run their own computation; this
/// is stampede protection, not a result cache. Errors are shared exactly
/// like values and nothing is retried here.
pub struct CoalescingLoader<T> {
    inflight: Mutex<HashMap<String, Arc<Inflight<T>>>>,
}

impl<T> Default for CoalescingLoader<T> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> std::fmt::Debug for CoalescingLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingLoader")
            .field("inflight", &self.inflight_count())
            .finish()
    }
}

impl<T> CoalescingLoader<T> {
    /// Number of keys with a computation currently running.
    pub fn inflight_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Inflight<T>>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> CoalescingLoader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Run ==
    /// Returns the result of `compute` for `key`, sharing it with every
    /// caller that arrives while it is running.
    ///
    /// A waiting caller has no timeout. Dropping any caller's future, the
    /// leader's included, does not cost the others their result: when the
    /// leader goes away before finishing, the remaining callers claim the
    /// key again and one of them runs its own `compute`.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            match self.claim(key) {
                InflightRole::Waiter(mut rx) => {
                    debug!(key, "joined in-flight computation");
                    let shared = match rx.wait_for(Option::is_some).await {
                        Ok(slot) => slot.clone(),
                        Err(_) => None,
                    };
                    match shared {
                        Some(Outcome::Done(result)) => return result,
                        _ => debug!(key, "leader abandoned computation, claiming again"),
                    }
                }
                InflightRole::Leader(slot) => {
                    let mut leader = Leader {
                        loader: self,
                        key: key.to_string(),
                        slot: Some(slot),
                    };
                    let result = compute().await;
                    leader.publish(Outcome::Done(result.clone()));
                    return result;
                }
            }
        }
    }

    fn claim(&self, key: &str) -> InflightRole<T> {
        let mut inflight = self.lock();
        if let Some(existing) = inflight.get(key) {
            existing.waiters.fetch_add(1, Ordering::SeqCst);
            return InflightRole::Waiter(existing.result.subscribe());
        }

        let (result, _) = watch::channel(None);
        let slot = Arc::new(Inflight {
            result,
            waiters: AtomicUsize::new(0),
        });
        inflight.insert(key.to_string(), Arc::clone(&slot));
        InflightRole::Leader(slot)
    }

    /// Removes the entry and hands `outcome` to every joined waiter in one
    /// critical section, so no caller can join a finished computation.
    fn release(&self, key: &str, slot: &Arc<Inflight<T>>, outcome: Outcome<T>) {
        let mut inflight = self.lock();
        if inflight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            inflight.remove(key);
        }
        slot.result.send_replace(Some(outcome));
        drop(inflight);

        let waiters = slot.waiters.load(Ordering::SeqCst);
        if waiters > 0 {
            debug!(key, waiters, "shared result with waiting callers");
        }
    }
}

/// Ownership of an in-flight entry; releases it even if the leader's future
/// is dropped or unwinds.
struct Leader<'a, T: Clone> {
    loader: &'a CoalescingLoader<T>,
    key: String,
    slot: Option<Arc<Inflight<T>>>,
}

impl<T: Clone> Leader<'_, T> {
    fn publish(&mut self, outcome: Outcome<T>) {
        if let Some(slot) = self.slot.take() {
            self.loader.release(&self.key, &slot, outcome);
        }
    }
}

impl<T: Clone> Drop for Leader<'_, T> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            debug!(key = %self.key, "leader dropped before finishing");
            self.publish(Outcome::Abandoned);
        }
    }
}
