//! In-process fallback store: bounded, TTL-expiring, LFU eviction.
//!
//! # Responsibilities
//! - Hold cache entries while the primary store is unreachable
//! - Evict the least frequently read entry when full
//! - Expire entries lazily on read and eagerly via a periodic sweep
//!
//! # Design Decisions
//! - One mutex around the whole map; key cardinality is in the hundreds
//! - LFU ties are broken by map iteration order (arbitrary)
//! - The sweep holds only a `Weak` reference and stops on shutdown or drop

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{CacheError, CacheStore};
use crate::observability::metrics;

#[derive(Debug)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
    frequency: u64,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Size-bounded in-memory store used when the primary cache fails.
#[derive(Debug)]
pub struct BoundedFallbackStore {
    capacity: usize,
    ttl: Duration,
    items: Mutex<HashMap<String, Entry>>,
}

impl BoundedFallbackStore {
    /// Create a store holding at most `capacity` entries.
    ///
    /// `ttl` sets the sweep period (`ttl / 2`); each entry still expires
    /// after the ttl passed to [`insert`](Self::insert).
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            items: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read count of a live entry without touching it.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        let items = self.lock();
        items
            .get(key)
            .filter(|e| !e.is_expired(Instant::now()))
            .map(|e| e.frequency)
    }

    /// Return the payload and bump its frequency, or `None` if absent/expired.
    pub fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let mut items = self.lock();
        let now = Instant::now();

        if items.get(key).is_some_and(|e| e.is_expired(now)) {
            items.remove(key);
            metrics::record_fallback_size(items.len());
            return None;
        }

        let entry = items.get_mut(key)?;
        entry.frequency += 1;
        Some(entry.payload.clone())
    }

    /// Insert or overwrite `key`, evicting the least frequently used entry
    /// when a new key would exceed capacity.
    pub fn insert(&self, key: &str, payload: Vec<u8>, ttl: Duration) {
        let mut items = self.lock();

        if !items.contains_key(key) && items.len() >= self.capacity {
            let victim = items
                .iter()
                .min_by_key(|(_, e)| e.frequency)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                items.remove(&victim);
                metrics::record_fallback_eviction();
                tracing::debug!(key = %victim, "Evicted least frequently used fallback entry");
            }
        }

        items.insert(
            key.to_string(),
            Entry {
                payload,
                expires_at: Instant::now() + ttl,
                frequency: 1,
            },
        );
        metrics::record_fallback_size(items.len());
    }

    /// Remove every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut items = self.lock();
        let now = Instant::now();
        let before = items.len();
        items.retain(|_, e| !e.is_expired(now));
        let removed = before - items.len();
        if removed > 0 {
            metrics::record_fallback_size(items.len());
        }
        removed
    }

    /// Start the periodic expiry sweep (every ttl/2).
    ///
    /// Returns `None` when the configured ttl is zero.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        let period = self.ttl / 2;
        if period.is_zero() {
            return None;
        }
        let store: Weak<Self> = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(live) = store.upgrade() else { break };
                        let removed = live.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "Fallback sweep purged expired entries");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Fallback sweeper received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheStore for BoundedFallbackStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, payload, ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_within_ttl_and_miss_after() {
        let store = BoundedFallbackStore::new(10, TTL);
        store.insert("bridge:all", b"[1,2,3]".to_vec(), TTL);

        assert_eq!(store.lookup("bridge:all").as_deref(), Some(&b"[1,2,3]"[..]));

        time::advance(TTL + Duration::from_millis(1)).await;
        assert_eq!(store.lookup("bridge:all"), None);
        assert!(store.is_empty(), "expired entry is deleted on read");
    }

    #[tokio::test]
    async fn test_frequency_starts_at_one_and_counts_reads() {
        let store = BoundedFallbackStore::new(10, TTL);
        store.insert("k", vec![1], TTL);
        assert_eq!(store.frequency("k"), Some(1));

        store.lookup("k");
        store.lookup("k");
        assert_eq!(store.frequency("k"), Some(3));

        store.insert("k", vec![2], TTL);
        assert_eq!(store.frequency("k"), Some(1), "overwrite resets frequency");
    }

    #[tokio::test]
    async fn test_evicts_never_read_key_when_full() {
        let store = BoundedFallbackStore::new(3, TTL);
        store.insert("a", vec![1], TTL);
        store.insert("b", vec![2], TTL);
        store.insert("cold", vec![3], TTL);
        for _ in 0..2 {
            store.lookup("a");
            store.lookup("b");
        }

        store.insert("d", vec![4], TTL);

        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("cold"), None);
        assert!(store.lookup("a").is_some());
        assert!(store.lookup("b").is_some());
        assert!(store.lookup("d").is_some());
    }

    #[tokio::test]
    async fn test_overwrite_at_capacity_does_not_evict() {
        let store = BoundedFallbackStore::new(2, TTL);
        store.insert("a", vec![1], TTL);
        store.insert("b", vec![2], TTL);
        store.insert("a", vec![3], TTL);

        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("a"), Some(vec![3]));
        assert_eq!(store.lookup("b"), Some(vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_unread_entries_and_stops_on_shutdown() {
        let store = Arc::new(BoundedFallbackStore::new(10, TTL));
        let shutdown = Shutdown::new();
        let handle = store.spawn_sweeper(shutdown.subscribe()).unwrap();

        store.insert("short", vec![1], Duration::from_secs(10));
        store.insert("long", vec![2], Duration::from_secs(600));

        time::sleep(TTL / 2 + Duration::from_millis(1)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.frequency("long"), Some(1));

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_store_dropped() {
        let store = Arc::new(BoundedFallbackStore::new(10, TTL));
        let shutdown = Shutdown::new();
        let handle = store.spawn_sweeper(shutdown.subscribe()).unwrap();

        drop(store);
        time::sleep(TTL).await;
        handle.await.unwrap();
    }
}
