//! Read path: single-key and aggregate lookups.

use std::sync::Arc;

use tessera_core::{
    CacheKey, CachePayload, CoercionError, Result, Setting, SettingType, SettingValue,
    SettingsBundle, SettingsError, SettingsFilter, SettingsMap,
};
use tracing::{debug, info, warn};

use super::SettingsService;
use crate::defaults::default_bundle;

impl SettingsService {
    /// Look up one setting: local → distributed → store.
    ///
    /// Returns `Ok(None)` when the key does not exist in the store. Only a
    /// store failure produces an error.
    pub async fn get_setting(&self, key: &str) -> Result<Option<SettingValue>> {
        let cache_key = CacheKey::Setting(key);

        if let Some(payload) = self.local.get(key) {
            match payload.typed_value() {
                Ok(value) => {
                    debug!(key = %key, "setting cache hit (local)");
                    return Ok(Some(value));
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Dropping local entry that does not coerce");
                    self.local.delete(key);
                }
            }
        }

        let distributed_key = cache_key.to_string();
        if let Some(payload) = self.read_distributed::<CachePayload>(&distributed_key).await {
            match payload.typed_value() {
                Ok(value) => {
                    debug!(key = %key, "setting cache hit (distributed)");
                    self.local
                        .set(key, payload, self.policy.local_ttl(&cache_key));
                    return Ok(Some(value));
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Ignoring distributed entry that does not coerce");
                }
            }
        }

        let Some(setting) = self
            .store
            .find_by_key(key)
            .await
            .map_err(|e| self.store_error("find_by_key", key, e))?
        else {
            debug!(key = %key, "setting not found");
            return Ok(None);
        };

        let value = setting
            .typed_value()
            .map_err(|source| SettingsError::validation(key, source))?;
        let payload = CachePayload::from(&setting);

        self.local
            .set(key, payload.clone(), self.policy.local_ttl(&cache_key));
        self.write_distributed(
            &distributed_key,
            &payload,
            self.policy.distributed_ttl(&cache_key),
        )
        .await;

        debug!(key = %key, "setting loaded from store");
        Ok(Some(value))
    }

    /// The full stored row, read straight from the store (never cached).
    pub async fn get_setting_record(&self, key: &str) -> Result<Option<Setting>> {
        self.store
            .find_by_key(key)
            .await
            .map_err(|e| self.store_error("find_by_key", key, e))
    }

    /// Typed getters: fail with `Validation` if the stored type differs.
    pub async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_typed(key, SettingType::Boolean, |v| v.as_bool()).await
    }

    pub async fn get_number(&self, key: &str) -> Result<Option<f64>> {
        self.get_typed(key, SettingType::Number, |v| v.as_f64()).await
    }

    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_typed(key, SettingType::String, |v| v.as_str().map(str::to_string))
            .await
    }

    pub async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.get_typed(key, SettingType::Json, |v| match v {
            SettingValue::Json(json) => Some(json.clone()),
            _ => None,
        })
        .await
    }

    async fn get_typed<T>(
        &self,
        key: &str,
        expected: SettingType,
        extract: impl FnOnce(&SettingValue) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get_setting(key).await? {
            None => Ok(None),
            Some(value) => extract(&value).map(Some).ok_or_else(|| {
                SettingsError::validation(
                    key,
                    CoercionError::type_mismatch(expected, value.setting_type()),
                )
            }),
        }
    }

    /// Every setting in `category`.
    pub async fn get_by_category(&self, category: &str) -> Result<SettingsMap> {
        self.read_aggregate(CacheKey::Category(category)).await
    }

    /// Every setting flagged public.
    pub async fn get_public_settings(&self) -> Result<SettingsMap> {
        self.read_aggregate(CacheKey::Public).await
    }

    /// Every setting.
    pub async fn get_all_settings(&self) -> Result<SettingsMap> {
        self.read_aggregate(CacheKey::All).await
    }

    /// Aggregate lookup with the same tier precedence as `get_setting`.
    ///
    /// When the store holds no settings at all, the built-in default bundle is
    /// served and cached for `defaults_ttl` only. An empty view over a
    /// non-empty store (an unknown category, no public rows) stays empty.
    async fn read_aggregate(&self, cache_key: CacheKey<'_>) -> Result<SettingsMap> {
        let key = cache_key.to_string();

        if let Some(bundle) = self.aggregates.get(&key) {
            debug!(namespace = %key, "aggregate cache hit (local)");
            return Ok(coerce_bundle(&bundle));
        }

        if let Some(bundle) = self.read_distributed::<SettingsBundle>(&key).await {
            debug!(namespace = %key, "aggregate cache hit (distributed)");
            let settings = coerce_bundle(&bundle);
            self.aggregates
                .set(key, Arc::new(bundle), self.policy.local_ttl(&cache_key));
            return Ok(settings);
        }

        let filter = cache_key.filter();
        let rows = self
            .store
            .find_all(&filter)
            .await
            .map_err(|e| self.store_error("find_all", &key, e))?;

        let (bundle, local_ttl, distributed_ttl) = if rows.is_empty()
            && self.store_is_empty(&cache_key).await?
        {
            info!(namespace = %key, "No stored settings, serving built-in defaults");
            let ttl = self.policy.defaults_ttl;
            (default_bundle(&filter), self.policy.local_ttl.min(ttl), ttl)
        } else {
            let bundle: SettingsBundle = rows
                .iter()
                .map(|setting| (setting.key.clone(), CachePayload::from(setting)))
                .collect();
            (
                bundle,
                self.policy.local_ttl(&cache_key),
                self.policy.distributed_ttl(&cache_key),
            )
        };

        let settings = coerce_bundle(&bundle);
        self.write_distributed(&key, &bundle, distributed_ttl).await;
        self.aggregates.set(key, Arc::new(bundle), local_ttl);

        Ok(settings)
    }

    /// Whether the store holds no settings. Only asked after a filtered
    /// aggregate came back empty.
    async fn store_is_empty(&self, cache_key: &CacheKey<'_>) -> Result<bool> {
        if matches!(cache_key, CacheKey::All) {
            return Ok(true);
        }
        let rows = self
            .store
            .find_all(&SettingsFilter::all())
            .await
            .map_err(|e| self.store_error("find_all", &cache_key.to_string(), e))?;
        Ok(rows.is_empty())
    }
}

/// Coerce every payload, skipping (and logging) any that no longer parse.
fn coerce_bundle(bundle: &SettingsBundle) -> SettingsMap {
    bundle
        .iter()
        .filter_map(|(key, payload)| match payload.typed_value() {
            Ok(value) => Some((key.clone(), value)),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping aggregate entry that does not coerce");
                None
            }
        })
        .collect()
}
