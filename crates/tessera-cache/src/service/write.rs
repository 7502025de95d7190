//! Write path: validate, persist, then invalidate every namespace that could
//! hold a stale copy.

use chrono::Utc;
use serde_json::Value;
use tessera_core::{
    CacheKey, NewSetting, Result, Setting, SettingsError, SettingsMap, coercion,
};
use tracing::{debug, info, warn};

use super::SettingsService;

/// Outcome of one key in a bulk update.
#[derive(Debug)]
pub struct BulkUpdateResult {
    pub key: String,
    /// Rows affected on success.
    pub outcome: Result<u64>,
}

impl BulkUpdateResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-key results of a bulk update plus the refreshed full settings view.
#[derive(Debug)]
pub struct BulkUpdateReport {
    pub results: Vec<BulkUpdateResult>,
    /// `None` when the view could not be reloaded after the writes.
    pub settings: Option<SettingsMap>,
}

impl BulkUpdateReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BulkUpdateResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

impl SettingsService {
    /// Replace the value of an existing setting.
    ///
    /// Never creates a setting. The value is coerced to the setting's declared
    /// type before it is persisted; every cached copy is invalidated before
    /// this returns, so a subsequent read by the same caller sees the new value.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the key does not exist, or the store matched zero rows
    /// - `Validation` if the value cannot be coerced to the declared type
    /// - `Store` if the store fails
    pub async fn update_setting(
        &self,
        key: &str,
        value: &Value,
        updated_by: Option<&str>,
    ) -> Result<u64> {
        let existing = self
            .store
            .find_by_key(key)
            .await
            .map_err(|e| self.store_error("find_by_key", key, e))?
            .ok_or_else(|| SettingsError::not_found(key))?;

        let raw = coercion::to_storage(value, existing.setting_type)
            .map_err(|source| SettingsError::validation(key, source))?;

        let affected = self
            .store
            .update(key, &raw, updated_by)
            .await
            .map_err(|e| self.store_error("update", key, e))?;

        self.invalidate(key, &existing.category).await;

        if affected == 0 {
            warn!(key = %key, "Store matched no rows on update");
            return Err(SettingsError::not_found(key));
        }

        info!(key = %key, updated_by = ?updated_by, "Setting updated");
        Ok(affected)
    }

    /// Apply `update_setting` to each entry independently.
    ///
    /// One failing key never aborts its siblings. The per-key results are
    /// always returned since earlier writes are already committed; a failure
    /// reloading the full view leaves `settings` empty.
    pub async fn update_settings<I, K>(
        &self,
        updates: I,
        updated_by: Option<&str>,
    ) -> BulkUpdateReport
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut results = Vec::new();
        for (key, value) in updates {
            let key = key.into();
            let outcome = self.update_setting(&key, &value, updated_by).await;
            if let Err(ref e) = outcome {
                debug!(key = %key, error = %e, "Bulk update entry failed");
            }
            results.push(BulkUpdateResult { key, outcome });
        }

        let settings = match self.get_all_settings().await {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(error = %e, "Failed to reload settings after bulk update");
                None
            }
        };
        let report = BulkUpdateReport { results, settings };

        info!(
            total = report.results.len(),
            succeeded = report.succeeded(),
            "Bulk settings update finished"
        );
        report
    }

    /// Create a new setting.
    ///
    /// # Errors
    ///
    /// - `Validation` if the value does not satisfy the declared type
    /// - `Conflict` if the key already exists
    pub async fn create_setting(&self, new: NewSetting) -> Result<Setting> {
        let raw = coercion::to_storage(&new.value, new.setting_type)
            .map_err(|source| SettingsError::validation(&new.key, source))?;

        let now = Utc::now();
        let setting = Setting {
            key: new.key,
            value: raw,
            setting_type: new.setting_type,
            category: new.category,
            is_public: new.is_public,
            description: new.description,
            updated_by: new.updated_by,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .create(&setting)
            .await
            .map_err(|e| self.store_error("create", &setting.key, e))?;

        self.invalidate(&created.key, &created.category).await;

        info!(key = %created.key, category = %created.category, "Setting created");
        Ok(created)
    }

    /// Delete a setting.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key does not exist.
    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        let existing = self
            .store
            .find_by_key(key)
            .await
            .map_err(|e| self.store_error("find_by_key", key, e))?
            .ok_or_else(|| SettingsError::not_found(key))?;

        let deleted = self
            .store
            .delete(key)
            .await
            .map_err(|e| self.store_error("delete", key, e))?;

        self.invalidate(key, &existing.category).await;

        if !deleted {
            return Err(SettingsError::not_found(key));
        }

        info!(key = %key, "Setting deleted");
        Ok(())
    }

    /// Drop every cached copy that could contain `key`.
    ///
    /// Deliberately coarse: the public aggregate is dropped even for private
    /// settings.
    async fn invalidate(&self, key: &str, category: &str) {
        self.local.delete(key);
        self.flags.invalidate(key);

        let keys = [
            CacheKey::Setting(key),
            CacheKey::Category(category),
            CacheKey::Public,
            CacheKey::All,
        ]
        .map(|k| k.to_string());

        for aggregate in &keys[1..] {
            self.aggregates.delete(aggregate);
        }
        self.delete_distributed(&keys).await;

        debug!(key = %key, category = %category, "Invalidated cached copies");
    }
}
