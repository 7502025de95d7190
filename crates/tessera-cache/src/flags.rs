//! Feature flag sub-cache.
//!
//! A short-TTL map of resolved flag states, separate from the generic tiers
//! so that flags checked on nearly every request never contend with setting
//! backfills or pay for value coercion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::local::{CacheStats, Sweep};

/// A resolved flag state with an absolute expiry.
#[derive(Debug, Clone, Copy)]
struct FeatureFlagEntry {
    enabled: bool,
    expires_at: Instant,
}

/// Cache of resolved feature flag states.
pub struct FeatureFlagCache {
    entries: DashMap<String, FeatureFlagEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FeatureFlagCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached state for `flag`, if present and not expired.
    pub fn get(&self, flag: &str) -> Option<bool> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(flag) {
            if entry.expires_at > now {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.enabled);
            }
            drop(entry);
            if self
                .entries
                .remove_if(flag, |_, entry| entry.expires_at <= now)
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, flag: impl Into<String>, enabled: bool) {
        self.entries.insert(
            flag.into(),
            FeatureFlagEntry {
                enabled,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, flag: &str) {
        self.entries.remove(flag);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Split `flags` into already-cached states and keys still to resolve.
    ///
    /// Duplicate keys are resolved once.
    pub fn partition<S: AsRef<str>>(&self, flags: &[S]) -> (HashMap<String, bool>, Vec<String>) {
        let mut cached = HashMap::new();
        let mut uncached: Vec<String> = Vec::new();

        for flag in flags {
            let flag = flag.as_ref();
            if cached.contains_key(flag) || uncached.iter().any(|k| k == flag) {
                continue;
            }
            match self.get(flag) {
                Some(enabled) => {
                    cached.insert(flag.to_string(), enabled);
                }
                None => uncached.push(flag.to_string()),
            }
        }

        (cached, uncached)
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
}

impl Sweep for FeatureFlagCache {
    fn name(&self) -> &'static str {
        "feature_flags"
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }
}

impl std::fmt::Debug for FeatureFlagCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFlagCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_put_get_and_expiry() {
        let cache = FeatureFlagCache::new(Duration::from_secs(30));
        cache.put("maintenance_mode", false);
        assert_eq!(cache.get("maintenance_mode"), Some(false));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get("maintenance_mode"), None);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partition_dedupes() {
        let cache = FeatureFlagCache::new(Duration::from_secs(30));
        cache.put("a", true);

        let (cached, uncached) = cache.partition(&["a", "b", "c", "b", "a"]);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.get("a"), Some(&true));
        assert_eq!(uncached, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep() {
        let cache = FeatureFlagCache::new(Duration::from_secs(1));
        cache.put("a", true);
        cache.put("b", false);
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.sweep(), 2);
        assert!(cache.is_empty());
    }
}
