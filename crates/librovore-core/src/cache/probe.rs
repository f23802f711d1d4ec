//! The probe cache: `url -> Result<bool, error>`, LRU-evicted by entry
//! count (spec §4.1).

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::types::{CacheEntry, Possession};
use crate::utils::now_seconds;

use super::dedup::RequestDedup;

/// Caches whether a URL exists, deduplicating concurrent probes of the same
/// URL and evicting the least-recently-used entry once `entries_max` is
/// exceeded.
pub struct ProbeCache {
    entries: Mutex<HashMap<String, CacheEntry<bool, String>>>,
    order: Mutex<VecDeque<String>>,
    dedup: Arc<RequestDedup>,
    entries_max: usize,
    success_ttl: f64,
    error_ttl: f64,
}

impl ProbeCache {
    /// Constructs a probe cache with the given eviction bound and TTL pair.
    #[must_use]
    pub fn new(entries_max: usize, success_ttl: f64, error_ttl: f64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            dedup: Arc::new(RequestDedup::new()),
            entries_max,
            success_ttl,
            error_ttl,
        }
    }

    /// Returns the cached outcome for `url`, if fresh. Expired entries are
    /// removed on touch.
    pub async fn access(&self, url: &str) -> Possession<Result<bool, String>> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get(url) else {
            return Possession::Absent;
        };
        if entry.is_expired(now_seconds()) {
            entries.remove(url);
            drop(entries);
            self.order.lock().await.retain(|k| k != url);
            return Possession::Absent;
        }
        let outcome = entry.outcome.clone();
        drop(entries);
        self.touch(url).await;
        Possession::Possessed(outcome)
    }

    /// Stores `outcome` for `url`, then evicts least-recently-used entries
    /// until `entries_max` is satisfied.
    pub async fn store(&self, url: &str, outcome: Result<bool, String>) {
        let ttl = if outcome.is_ok() {
            self.success_ttl
        } else {
            self.error_ttl
        };
        let entry = CacheEntry {
            outcome,
            timestamp: now_seconds(),
            ttl,
        };
        self.entries.lock().await.insert(url.to_string(), entry);
        self.touch(url).await;
        self.evict_excess().await;
    }

    /// Returns the cached value, or computes it via `fetch` exactly once
    /// across concurrent callers, re-checking the cache immediately after
    /// acquiring the per-URL lock (spec §4.1, §8 scenario 6).
    pub async fn get_or_fetch<F, Fut>(&self, url: &str, fetch: F) -> Result<bool, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, String>>,
    {
        if let Possession::Possessed(outcome) = self.access(url).await {
            return outcome;
        }
        let guard = self.dedup.acquire(url).await;
        if let Possession::Possessed(outcome) = self.access(url).await {
            drop(guard);
            return outcome;
        }
        let outcome = fetch().await;
        self.store(url, outcome.clone()).await;
        drop(guard);
        outcome
    }

    async fn touch(&self, url: &str) {
        let mut order = self.order.lock().await;
        order.retain(|k| k != url);
        order.push_back(url.to_string());
    }

    async fn evict_excess(&self) {
        let mut entries = self.entries.lock().await;
        let mut order = self.order.lock().await;
        while entries.len() > self.entries_max {
            let Some(oldest) = order.pop_front() else {
                break;
            };
            entries.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_max_zero_never_retains() {
        let cache = ProbeCache::new(0, 300.0, 30.0);
        cache.store("u", Ok(true)).await;
        assert!(cache.access("u").await.is_absent());
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = ProbeCache::new(10, -1.0, -1.0);
        cache.store("u", Ok(true)).await;
        assert!(cache.access("u").await.is_absent());
    }

    #[tokio::test]
    async fn lru_evicts_oldest_entry_first() {
        let cache = ProbeCache::new(1, 300.0, 30.0);
        cache.store("a", Ok(true)).await;
        cache.store("b", Ok(true)).await;
        assert!(cache.access("a").await.is_absent());
        assert!(!cache.access("b").await.is_absent());
    }
}
