// =============================================================================
// Fetch Cache — time-windowed memo in front of the market-data provider
// =============================================================================
//
// `get_or_fetch(key, fetch)` serves a stored payload when it was fetched less
// than `window` ago; otherwise it runs `fetch`, stores a success and returns
// it.  A failed fetch stores nothing, so the next call retries immediately,
// and a stale payload already in the cache is left as it was.
//
// Keys are the full request identity (URL with its query string).  The same
// request with its parameters in another order is a different key.
//
// Concurrent calls for one key are coalesced through a per-key async gate:
// the first caller fetches, the rest wait and then read the fresh entry.
// Capacity is bounded; inserting past it evicts the least recently used key.
//
// Locking: `entries` and `gates` are parking_lot mutexes held only for short
// map operations, never across an `.await`.
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Freshness window observed in the dashboard (one minute).
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);
/// Default upper bound on distinct keys.
pub const DEFAULT_CAPACITY: usize = 512;

struct CacheEntry<V> {
    payload: V,
    fetched_at: Instant,
    last_used: u64,
}

/// Serialisable snapshot of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub coalesced_hits: u64,
    pub misses: u64,
    pub failed_fetches: u64,
    pub evictions: u64,
}

pub struct FetchCache<V> {
    window: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    clock: AtomicU64,
    hits: AtomicU64,
    coalesced_hits: AtomicU64,
    misses: AtomicU64,
    failed_fetches: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> FetchCache<V> {
    /// Create a cache serving entries younger than `window`, holding at most
    /// `capacity` keys (a capacity of 0 is treated as 1).
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            coalesced_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failed_fetches: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Return the cached payload for `key` if fresh, otherwise run `fetch`.
    ///
    /// Returns `None` when the fetch fails; the failure is logged and nothing
    /// is cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(payload) = self.fresh(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache hit");
            return Some(payload);
        }

        let gate = self.gate_for(key);
        let guard = gate.lock().await;

        // Another caller may have filled the entry while we waited.
        let result = if let Some(payload) = self.fresh(key) {
            self.coalesced_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache hit after waiting on in-flight fetch");
            Some(payload)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache miss — fetching");
            match fetch().await {
                Ok(payload) => {
                    self.insert(key, payload.clone());
                    Some(payload)
                }
                Err(e) => {
                    self.failed_fetches.fetch_add(1, Ordering::Relaxed);
                    warn!(key, error = %e, "fetch failed — nothing cached");
                    None
                }
            }
        };

        drop(guard);
        self.release_gate(key, gate);
        result
    }

    /// Last stored payload for `key` regardless of age.
    pub fn last_known(&self, key: &str) -> Option<V> {
        self.entries.lock().get(key).map(|e| e.payload.clone())
    }

    fn fresh(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        if entry.fetched_at.elapsed() >= self.window {
            return None;
        }
        entry.last_used = self.tick();
        Some(entry.payload.clone())
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    fn insert(&self, key: &str, payload: V) {
        let last_used = self.tick();
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
                last_used,
            },
        );

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %k, "evicted least recently used entry");
                }
                None => break,
            }
        }
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            coalesced_hits: self.coalesced_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn gate_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.gates
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the caller's handle and forget the gate once nobody else holds one.
    /// Handles are only cloned and dropped under the `gates` lock, so the
    /// strong count seen here is exact.
    fn release_gate(&self, key: &str, gate: Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.gates.lock();
        drop(gate);
        if gates.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(key);
        }
    }
}

impl<V> std::fmt::Debug for FetchCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCache")
            .field("window", &self.window)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> std::future::Ready<anyhow::Result<String>> {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value.to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_window_is_served_from_cache() {
        let cache = FetchCache::new(DEFAULT_FRESHNESS, 8);
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_fetch("url1", counting_fetch(&a, "A")).await;
        let second = cache.get_or_fetch("url1", counting_fetch(&b, "B")).await;

        assert_eq!(first.as_deref(), Some("A"));
        assert_eq!(second.as_deref(), Some("A"));
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let cache = FetchCache::new(Duration::from_secs(60), 8);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch("k", counting_fetch(&calls, "v1")).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        cache.get_or_fetch("k", counting_fetch(&calls, "v1")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        let v = cache.get_or_fetch("k", counting_fetch(&calls, "v2")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(v.as_deref(), Some("v2"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_not_cached() {
        let cache: FetchCache<String> = FetchCache::new(DEFAULT_FRESHNESS, 8);
        let calls = Arc::new(AtomicUsize::new(0));

        let failed = cache
            .get_or_fetch("k", || async { Err(anyhow::anyhow!("connection reset")) })
            .await;
        assert!(failed.is_none());
        assert!(cache.is_empty());

        let retried = cache.get_or_fetch("k", counting_fetch(&calls, "ok")).await;
        assert_eq!(retried.as_deref(), Some("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().failed_fetches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_stale_entry() {
        let cache = FetchCache::new(Duration::from_secs(10), 8);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_fetch("k", counting_fetch(&calls, "old")).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let v = cache
            .get_or_fetch("k", || async { Err(anyhow::anyhow!("503")) })
            .await;
        assert!(v.is_none());
        assert_eq!(cache.last_known("k").as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn concurrent_requests_for_one_key_fetch_once() {
        let cache = Arc::new(FetchCache::new(DEFAULT_FRESHNESS, 8));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("same", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, anyhow::Error>(42_u32)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Some(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.gates.lock().is_empty());
    }

    #[tokio::test]
    async fn waiter_fetches_after_in_flight_failure() {
        let cache = Arc::new(FetchCache::new(DEFAULT_FRESHNESS, 8));
        let retries = Arc::new(AtomicUsize::new(0));

        let failing = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("same", || async {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Err::<u32, _>(anyhow::anyhow!("connection reset"))
                    })
                    .await
            })
        };
        // Let the failing fetch take the gate first.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let waiting = {
            let cache = cache.clone();
            let retries = retries.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("same", || async move {
                        retries.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, anyhow::Error>(7_u32)
                    })
                    .await
            })
        };

        assert_eq!(failing.await.unwrap(), None);
        assert_eq!(waiting.await.unwrap(), Some(7));
        assert_eq!(retries.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.failed_fetches, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.coalesced_hits, 0);
        assert_eq!(cache.last_known("same"), Some(7));
        assert!(cache.gates.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lru_evicts_least_recently_used() {
        let cache = FetchCache::new(DEFAULT_FRESHNESS, 2);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch("a", counting_fetch(&calls, "A")).await;
        cache.get_or_fetch("b", counting_fetch(&calls, "B")).await;
        // Touch "a" so "b" becomes the eviction candidate.
        cache.get_or_fetch("a", counting_fetch(&calls, "A")).await;
        cache.get_or_fetch("c", counting_fetch(&calls, "C")).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.last_known("a").is_some());
        assert!(cache.last_known("b").is_none());
        assert!(cache.last_known("c").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parameter_order_yields_distinct_keys() {
        let cache = FetchCache::new(DEFAULT_FRESHNESS, 8);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_fetch("/q?a=1&b=2", counting_fetch(&calls, "x")).await;
        cache.get_or_fetch("/q?b=2&a=1", counting_fetch(&calls, "x")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_and_invalidate() {
        let cache = FetchCache::new(DEFAULT_FRESHNESS, 8);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_fetch("a", counting_fetch(&calls, "A")).await;
        cache.get_or_fetch("b", counting_fetch(&calls, "B")).await;

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_fetch("b", counting_fetch(&calls, "B")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
