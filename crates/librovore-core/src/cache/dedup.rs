//! Per-URL request deduplication (spec §4.1 "Request deduplication", §9
//! "Request mutex map").
//!
//! A map from key to mutex is created on first wait and removed once the
//! last waiter releases it, so concurrent callers for the same key collapse
//! to a single upstream request without the map growing without bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A map of in-flight per-key mutexes.
#[derive(Default)]
pub struct RequestDedup {
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RequestDedup {
    /// Constructs an empty dedup map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the mutex for `key`, creating it if this is the first
    /// waiter. The returned guard releases and, if it was the last holder,
    /// removes the entry from the map on drop.
    pub async fn acquire(self: &Arc<Self>, key: &str) -> DedupGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let permit = mutex.clone().lock_owned().await;
        DedupGuard {
            dedup: self.clone(),
            key: key.to_string(),
            mutex,
            permit: Some(permit),
        }
    }

    fn release(&self, key: &str, mutex: &Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = locks.get(key) {
            // Two references remain right before removal: this map's entry
            // and the guard's own clone (already dropped its permit by now).
            if Arc::ptr_eq(existing, mutex) && Arc::strong_count(existing) <= 2 {
                locks.remove(key);
            }
        }
    }
}

/// Holds a key's mutex for the lifetime of one upstream request.
pub struct DedupGuard {
    dedup: Arc<RequestDedup>,
    key: String,
    mutex: Arc<AsyncMutex<()>>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl Drop for DedupGuard {
    fn drop(&mut self) {
        self.permit.take();
        self.dedup.release(&self.key, &self.mutex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequential_acquisitions_do_not_leak_entries() {
        let dedup = Arc::new(RequestDedup::new());
        {
            let _guard = dedup.acquire("https://example.com").await;
        }
        {
            let _guard = dedup.acquire("https://example.com").await;
        }
        assert!(dedup.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_acquisitions_serialize() {
        let dedup = Arc::new(RequestDedup::new());
        let guard = dedup.acquire("u").await;
        let dedup2 = dedup.clone();
        let handle = tokio::spawn(async move {
            let _g = dedup2.acquire("u").await;
        });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        drop(guard);
        handle.await.unwrap();
    }
}
