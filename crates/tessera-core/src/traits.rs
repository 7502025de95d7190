//! Adapter contracts consumed by the settings orchestrator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DistributedCacheError, StoreError};
use crate::types::{Setting, SettingsFilter};

/// The authoritative settings store.
///
/// The only component allowed to mutate [`Setting`] rows. Implementations
/// must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads one setting by key. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing keys.
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>, StoreError>;

    /// Reads every setting matching `filter`, ordered by category then key.
    async fn find_all(&self, filter: &SettingsFilter) -> Result<Vec<Setting>, StoreError>;

    /// Replaces the stored value of an existing setting.
    ///
    /// Returns the number of rows affected; `0` means no row matched `key`.
    async fn update(
        &self,
        key: &str,
        value: &str,
        updated_by: Option<&str>,
    ) -> Result<u64, StoreError>;

    /// Inserts a new setting and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the key already exists.
    async fn create(&self, setting: &Setting) -> Result<Setting, StoreError>;

    /// Deletes a setting. Returns `false` if no row matched `key`.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    // ==================== Convenience lookups ====================

    async fn find_by_category(&self, category: &str) -> Result<Vec<Setting>, StoreError> {
        self.find_all(&SettingsFilter::category(category)).await
    }

    async fn find_public(&self) -> Result<Vec<Setting>, StoreError> {
        self.find_all(&SettingsFilter::public()).await
    }

    async fn find_by_keys(&self, keys: &[String]) -> Result<Vec<Setting>, StoreError> {
        self.find_all(&SettingsFilter::keys(keys.to_vec())).await
    }
}

/// A network-shared key/value cache with per-key TTL.
///
/// Payloads are opaque text (serialized `{value, type}` JSON). Every error is
/// treated by the orchestrator as a miss.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Name of this backend (for logging and stats).
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, DistributedCacheError>;

    async fn set(&self, key: &str, payload: &str, ttl: Duration)
    -> Result<(), DistributedCacheError>;

    async fn delete(&self, key: &str) -> Result<(), DistributedCacheError>;

    /// Health probe.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Type alias for a shareable store instance.
pub type DynSettingsStore = Arc<dyn SettingsStore>;

/// Type alias for a shareable distributed cache instance.
pub type DynDistributedCache = Arc<dyn DistributedCache>;
