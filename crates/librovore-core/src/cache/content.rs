//! The content cache: `url -> Result<(bytes, headers), error>`, LRU-evicted
//! by total byte weight (spec §4.1).

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::types::{CacheEntry, Possession};
use crate::utils::now_seconds;

use super::dedup::RequestDedup;

/// A fetched body plus response headers (used to recover charset/mimetype
/// for [`crate::cache::CacheProxy::retrieve_as_text`]).
#[derive(Debug, Clone)]
pub struct ContentValue {
    /// The raw response body.
    pub bytes: Vec<u8>,
    /// Lower-cased response headers.
    pub headers: HashMap<String, String>,
}

/// Per-entry overhead (in bytes) added to every weight calculation,
/// including error entries, which are assumed to weigh exactly this much.
const ENTRY_OVERHEAD_BYTES: usize = 100;

fn weight_of(outcome: &Result<ContentValue, String>) -> usize {
    match outcome {
        Ok(value) => value.bytes.len() + ENTRY_OVERHEAD_BYTES,
        Err(_) => ENTRY_OVERHEAD_BYTES,
    }
}

/// Caches fetched bodies, deduplicating concurrent retrievals of the same
/// URL and evicting least-recently-used entries once `memory_max` bytes is
/// exceeded.
pub struct ContentCache {
    entries: Mutex<HashMap<String, CacheEntry<ContentValue, String>>>,
    order: Mutex<VecDeque<String>>,
    dedup: Arc<RequestDedup>,
    memory_max: usize,
    success_ttl: f64,
    error_ttl: f64,
}

impl ContentCache {
    /// Constructs a content cache with the given byte budget and TTL pair.
    #[must_use]
    pub fn new(memory_max: usize, success_ttl: f64, error_ttl: f64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            dedup: Arc::new(RequestDedup::new()),
            memory_max,
            success_ttl,
            error_ttl,
        }
    }

    /// Returns the cached outcome for `url`, if fresh.
    pub async fn access(&self, url: &str) -> Possession<Result<ContentValue, String>> {
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
    /// until the total byte weight is within `memory_max`.
    pub async fn store(&self, url: &str, outcome: Result<ContentValue, String>) {
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
    /// acquiring the per-URL lock.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        url: &str,
        fetch: F,
    ) -> Result<ContentValue, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ContentValue, String>>,
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
        let mut total: usize = entries.values().map(|e| weight_of(&e.outcome)).sum();
        while total > self.memory_max {
            let Some(oldest) = order.pop_front() else {
                break;
            };
            if let Some(entry) = entries.remove(&oldest) {
                total -= weight_of(&entry.outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(len: usize) -> ContentValue {
        ContentValue {
            bytes: vec![0u8; len],
            headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn memory_max_zero_never_retains() {
        let cache = ContentCache::new(0, 300.0, 30.0);
        cache.store("u", Ok(value(10))).await;
        assert!(cache.access("u").await.is_absent());
    }

    #[tokio::test]
    async fn evicts_when_budget_exceeded() {
        let cache = ContentCache::new(150, 300.0, 30.0);
        cache.store("a", Ok(value(10))).await;
        cache.store("b", Ok(value(10))).await;
        // a: 110 bytes, b: 110 bytes -> 220 total, over the 150 budget, a evicted.
        assert!(cache.access("a").await.is_absent());
        assert!(!cache.access("b").await.is_absent());
    }
}
