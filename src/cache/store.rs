//! Keyed TTL cache.
//!
//! A process-wide map from string keys to values with a per-entry TTL and a
//! capacity bound. When full, the oldest share of entries (by creation time)
//! is dropped in one batch; reads never reorder entries.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::error::CacheError;
use super::keys::{CacheKey, NAMESPACE_SEPARATOR};
use super::lock::mutex_lock;
use super::response::CachedResponse;

const SOURCE: &str = "cache::store";

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
    // Insertion order breaks ties between entries created at the same instant.
    sequence: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    next_sequence: u64,
}

/// Snapshot of cache occupancy, computed by scanning every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub max_size: usize,
}

/// Generic key/value cache with TTL expiry and oldest-first bulk eviction.
pub struct KeyedCache<V> {
    entries: Mutex<Entries<V>>,
    capacity: NonZeroUsize,
    default_ttl: Duration,
    eviction_percent: u8,
}

impl<V: Clone> KeyedCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.capacity, config.default_ttl, config.eviction_percent)
    }

    pub fn with_limits(capacity: NonZeroUsize, default_ttl: Duration, eviction_percent: u8) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::with_capacity(capacity.get()),
                next_sequence: 0,
            }),
            capacity,
            default_ttl,
            eviction_percent: eviction_percent.clamp(1, 100),
        }
    }

    /// Return the value for `key` if present and unexpired.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        match entries.map.get(key) {
            None => {
                counter!("chorus_cache_miss_total").increment(1);
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                counter!("chorus_cache_hit_total").increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        entries.map.remove(key);
        counter!("chorus_cache_expired_total").increment(1);
        counter!("chorus_cache_miss_total").increment(1);
        None
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, expiring `ttl` from now.
    ///
    /// Inserting a new key into a full cache first evicts the oldest entries.
    /// Replacing an existing key never evicts.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "set");

        if !entries.map.contains_key(&key) && entries.map.len() >= self.capacity.get() {
            let evicted = self.evict_oldest(&mut entries.map);
            debug!(evicted, capacity = self.capacity.get(), "cache full, evicted oldest entries");
        }

        let sequence = entries.next_sequence;
        entries.next_sequence += 1;
        entries.map.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
                sequence,
            },
        );
    }

    /// Remove `key`, reporting whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        mutex_lock(&self.entries, SOURCE, "delete")
            .map
            .remove(key)
            .is_some()
    }

    /// Remove every key under `namespace` (keys starting with `namespace:`).
    pub fn delete_namespace(&self, namespace: &str) -> usize {
        let prefix = format!("{namespace}{NAMESPACE_SEPARATOR}");
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete_namespace");
        let before = entries.map.len();
        entries.map.retain(|key, _| !key.starts_with(&prefix));
        before - entries.map.len()
    }

    /// Remove every entry.
    pub fn clear(&self) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "clear");
        let removed = entries.map.len();
        entries.map.clear();
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = mutex_lock(&self.entries, SOURCE, "stats");
        let expired = entries
            .map
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        CacheStats {
            total: entries.map.len(),
            active: entries.map.len() - expired,
            expired,
            max_size: self.capacity.get(),
        }
    }

    /// Drop every expired entry. Called by the background sweeper.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "sweep_expired");
        let before = entries.map.len();
        entries.map.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.map.len();
        if removed > 0 {
            counter!("chorus_cache_expired_total").increment(removed as u64);
        }
        removed
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_oldest(&self, map: &mut HashMap<String, CacheEntry<V>>) -> usize {
        let count = (map.len() * usize::from(self.eviction_percent) / 100).max(1);

        let mut by_age: Vec<(Instant, u64, &String)> = map
            .iter()
            .map(|(key, entry)| (entry.created_at, entry.sequence, key))
            .collect();
        by_age.sort_unstable();

        let victims: Vec<String> = by_age
            .into_iter()
            .take(count)
            .map(|(_, _, key)| key.clone())
            .collect();

        for key in &victims {
            map.remove(key);
        }
        counter!("chorus_cache_evict_total").increment(victims.len() as u64);
        victims.len()
    }
}

/// Storage seam used by the response interceptor and the invalidation bus.
///
/// Implementations must be cheap and synchronous; callers hold no lock across
/// these calls and treat every error as best-effort.
pub trait ResponseStore: Send + Sync {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    fn store(
        &self,
        key: &CacheKey,
        response: CachedResponse,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;

    fn remove_namespace(&self, namespace: &str) -> Result<usize, CacheError>;

    fn stats(&self) -> Result<CacheStats, CacheError>;
}

impl ResponseStore for KeyedCache<CachedResponse> {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.get(key.as_str()))
    }

    fn store(
        &self,
        key: &CacheKey,
        response: CachedResponse,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_with_ttl(key.as_str(), response, ttl);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.delete(key.as_str()))
    }

    fn remove_namespace(&self, namespace: &str) -> Result<usize, CacheError> {
        Ok(self.delete_namespace(namespace))
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(KeyedCache::stats(self))
    }
}
