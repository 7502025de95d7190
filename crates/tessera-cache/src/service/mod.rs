//! Settings orchestrator.
//!
//! Composes the local memory tier, the distributed tier and the
//! authoritative store into read-through and write-through operations.
//!
//! ```text
//! read  → local → distributed → store      (first hit wins, faster tiers backfilled)
//! write → validate → store → invalidate    (per-key + category + public + all)
//! ```
//!
//! Distributed-tier failures are logged and treated as misses. Store failures
//! are returned to the caller.

mod features;
mod read;
mod write;

pub use write::{BulkUpdateReport, BulkUpdateResult};

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tessera_core::{
    CacheKey, CachePayload, DistributedCacheError, DynDistributedCache, DynSettingsStore,
    SettingsBundle, SettingsError, StoreError,
};
use tracing::{error, info, warn};

use crate::distributed::NoopDistributedCache;
use crate::flags::FeatureFlagCache;
use crate::local::{CacheStats, LocalTier, Sweep};
use crate::policy::CachePolicy;
use crate::sweeper::SweeperHandle;

/// Builder for [`SettingsService`].
pub struct SettingsServiceBuilder {
    store: DynSettingsStore,
    distributed: Option<DynDistributedCache>,
    policy: CachePolicy,
}

impl SettingsServiceBuilder {
    pub fn new(store: DynSettingsStore) -> Self {
        Self {
            store,
            distributed: None,
            policy: CachePolicy::default(),
        }
    }

    /// Set the distributed tier. Defaults to a no-op tier.
    pub fn distributed(mut self, distributed: DynDistributedCache) -> Self {
        self.distributed = Some(distributed);
        self
    }

    pub fn policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> SettingsService {
        SettingsService {
            store: self.store,
            distributed: self
                .distributed
                .unwrap_or_else(|| Arc::new(NoopDistributedCache)),
            local: Arc::new(LocalTier::new("settings")),
            aggregates: Arc::new(LocalTier::new("aggregates")),
            flags: Arc::new(FeatureFlagCache::new(self.policy.flag_ttl)),
            policy: self.policy,
        }
    }
}

/// Statistics for every in-memory tier.
#[derive(Debug, Clone)]
pub struct ServiceStats {
    pub settings: CacheStats,
    pub aggregates: CacheStats,
    pub flags: CacheStats,
    pub distributed: String,
}

/// Read-through / write-through settings cache.
pub struct SettingsService {
    store: DynSettingsStore,
    distributed: DynDistributedCache,
    /// Per-key entries, keyed by setting key.
    local: Arc<LocalTier<CachePayload>>,
    /// Aggregate bundles, keyed by namespace cache key.
    aggregates: Arc<LocalTier<Arc<SettingsBundle>>>,
    flags: Arc<FeatureFlagCache>,
    policy: CachePolicy,
}

impl SettingsService {
    pub fn builder(store: DynSettingsStore) -> SettingsServiceBuilder {
        SettingsServiceBuilder::new(store)
    }

    /// A service with the default policy and no distributed tier.
    pub fn new(store: DynSettingsStore) -> Self {
        Self::builder(store).build()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Start the background sweeper over the local tier and the flag sub-cache.
    ///
    /// The returned handle stops the sweeper when `stop()`ped or dropped.
    pub fn start_sweeper(&self) -> SweeperHandle {
        let targets: Vec<Arc<dyn Sweep>> = vec![
            Arc::clone(&self.local) as Arc<dyn Sweep>,
            Arc::clone(&self.aggregates) as Arc<dyn Sweep>,
            Arc::clone(&self.flags) as Arc<dyn Sweep>,
        ];
        SweeperHandle::spawn(targets, self.policy.sweep_interval)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            settings: self.local.stats(),
            aggregates: self.aggregates.stats(),
            flags: self.flags.stats(),
            distributed: self.distributed.name().to_string(),
        }
    }

    /// Whether the distributed tier is reachable (for health checks).
    pub async fn is_distributed_available(&self) -> bool {
        self.distributed.is_available().await
    }

    /// Drop every cached copy this process knows about.
    ///
    /// Clears the local tier and flag sub-cache, and deletes the matching
    /// distributed keys plus the public and all aggregates.
    pub async fn clear_cache(&self) {
        let mut keys: Vec<String> = self
            .local
            .keys()
            .into_iter()
            .map(|key| CacheKey::Setting(&key).to_string())
            .collect();
        keys.extend(self.aggregates.keys());
        for aggregate in [CacheKey::Public, CacheKey::All] {
            let aggregate = aggregate.to_string();
            if !keys.contains(&aggregate) {
                keys.push(aggregate);
            }
        }

        self.local.clear();
        self.aggregates.clear();
        self.flags.clear();
        self.delete_distributed(&keys).await;

        info!(distributed_keys = keys.len(), "Settings cache cleared");
    }

    // ==================== Distributed tier helpers ====================

    /// Read and decode a distributed payload. Every failure is a miss.
    async fn read_distributed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.distributed.get(key).await {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    let err = SettingsError::from(DistributedCacheError::from(e));
                    warn!(key = %key, error = %err, "Discarding undecodable distributed payload");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                let err = SettingsError::from(e);
                warn!(key = %key, error = %err, "Distributed cache read failed, falling through");
                None
            }
        }
    }

    async fn write_distributed<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                let err = SettingsError::from(DistributedCacheError::from(e));
                warn!(key = %key, error = %err, "Failed to encode distributed payload");
                return;
            }
        };
        if let Err(e) = self.distributed.set(key, &payload, ttl).await {
            let err = SettingsError::from(e);
            warn!(key = %key, error = %err, "Distributed cache backfill failed");
        }
    }

    async fn delete_distributed(&self, keys: &[String]) {
        let results = join_all(keys.iter().map(|key| self.distributed.delete(key))).await;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                let err = SettingsError::from(e);
                warn!(key = %key, error = %err, "Distributed cache invalidation failed");
            }
        }
    }

    /// Convert a store failure for the caller, logging infrastructure errors.
    fn store_error(&self, operation: &'static str, key: &str, err: StoreError) -> SettingsError {
        if !matches!(err, StoreError::Conflict { .. }) {
            error!(operation, key = %key, error = %err, "Settings store operation failed");
        }
        SettingsError::from(err)
    }
}

impl std::fmt::Debug for SettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsService")
            .field("distributed", &self.distributed.name())
            .field("local_entries", &self.local.len())
            .field("aggregate_entries", &self.aggregates.len())
            .field("flag_entries", &self.flags.len())
            .field("policy", &self.policy)
            .finish()
    }
}
