//! Local memory tier: process-local TTL cache backed by `DashMap`.
//!
//! Expired entries are never returned. They are dropped lazily on the next
//! `get` for the same key, or by [`Sweep::sweep`] from the background
//! sweeper, whichever comes first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// A cached value with an absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently held (including not-yet-swept expired ones).
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because their TTL elapsed.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Something the background sweeper can purge of expired entries.
pub trait Sweep: Send + Sync {
    /// Name used in sweeper logs.
    fn name(&self) -> &'static str;

    /// Remove every expired entry. Returns the number removed.
    fn sweep(&self) -> usize;
}

/// Concurrent TTL map shared by every in-flight request.
///
/// `DashMap` shards the map behind per-shard `RwLock`s, so concurrent readers
/// proceed in parallel while writers to the same shard are serialized.
pub struct LocalTier<V> {
    name: &'static str,
    entries: DashMap<String, CacheEntry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone + Send + Sync> LocalTier<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Get a live entry. Expired entries behave exactly like a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            // Release the shard read lock before taking the write lock.
            drop(entry);
            if self
                .entries
                .remove_if(key, |_, entry| entry.is_expired_at(now))
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Keys currently held, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }

        removed
    }
}

impl<V: Clone + Send + Sync> Sweep for LocalTier<V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sweep(&self) -> usize {
        self.cleanup_expired()
    }
}

impl<V> std::fmt::Debug for LocalTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTier")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}
