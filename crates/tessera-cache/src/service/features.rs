//! Feature flag lookups.
//!
//! Flags fail open: a flag whose setting does not exist, or whose lookup
//! fails, is enabled.

use std::collections::HashMap;

use serde_json::Value;
use tessera_core::{SettingValue, SettingsError};
use tracing::{debug, warn};

use super::SettingsService;

impl SettingsService {
    /// Whether `flag` is enabled.
    ///
    /// Checks the flag sub-cache, then resolves through [`get_setting`].
    /// Never fails: a missing setting or a lookup error yields `true`.
    ///
    /// [`get_setting`]: SettingsService::get_setting
    pub async fn is_feature_enabled(&self, flag: &str) -> bool {
        if let Some(enabled) = self.flags.get(flag) {
            return enabled;
        }

        match self.get_setting(flag).await {
            Ok(Some(value)) => {
                let enabled = flag_state(flag, &value);
                self.flags.put(flag, enabled);
                enabled
            }
            Ok(None) => {
                debug!(flag = %flag, "Feature flag not configured, enabled by default");
                self.flags.put(flag, true);
                true
            }
            Err(e) => {
                warn!(flag = %flag, error = %e, "Feature flag lookup failed, failing open");
                true
            }
        }
    }

    /// Resolve several flags with at most one store round-trip.
    ///
    /// Cached flags are answered from the sub-cache; the rest are fetched
    /// together and cached. Missing flags and a failed fetch both fail open.
    pub async fn check_multiple_features<S: AsRef<str>>(&self, flags: &[S]) -> HashMap<String, bool> {
        let (mut results, uncached) = self.flags.partition(flags);
        if uncached.is_empty() {
            return results;
        }

        let rows = match self.store.find_by_keys(&uncached).await {
            Ok(rows) => rows,
            Err(e) => {
                let err = SettingsError::from(e);
                warn!(flags = ?uncached, error = %err, "Batch feature flag lookup failed, failing open");
                results.extend(uncached.into_iter().map(|flag| (flag, true)));
                return results;
            }
        };

        let found: HashMap<&str, _> = rows.iter().map(|s| (s.key.as_str(), s)).collect();

        for flag in uncached {
            let enabled = match found.get(flag.as_str()) {
                Some(setting) => match setting.typed_value() {
                    Ok(value) => flag_state(&flag, &value),
                    Err(e) => {
                        warn!(flag = %flag, error = %e, "Stored flag does not coerce, failing open");
                        true
                    }
                },
                None => true,
            };
            self.flags.put(flag.clone(), enabled);
            results.insert(flag, enabled);
        }

        results
    }
}

/// Interpret a setting value as a flag state.
///
/// Boolean settings and JSON booleans map directly and `"true"`/`"false"`
/// strings are accepted; anything else is treated as enabled.
fn flag_state(flag: &str, value: &SettingValue) -> bool {
    match value {
        SettingValue::Bool(enabled) | SettingValue::Json(Value::Bool(enabled)) => *enabled,
        SettingValue::String(s) => s.parse::<bool>().unwrap_or_else(|_| {
            warn!(flag = %flag, value = %s, "Feature flag string is not a boolean, treating as enabled");
            true
        }),
        other => {
            warn!(
                flag = %flag,
                setting_type = %other.setting_type(),
                "Feature flag is not boolean, treating as enabled"
            );
            true
        }
    }
}
