//! Cache key namespaces and the payload stored under them.
//!
//! ```text
//! settings:{key}                  one setting
//! settings:category:{category}    every setting in a category
//! settings:public                 every public setting
//! settings:all                    every setting
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coercion::{self, CoercionError};
use crate::types::{Setting, SettingType, SettingValue, SettingsFilter};

const PREFIX: &str = "settings";

/// A cache key in one of the four namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey<'a> {
    Setting(&'a str),
    Category(&'a str),
    Public,
    All,
}

impl CacheKey<'_> {
    /// Whether this key names an aggregate rather than a single setting.
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, CacheKey::Setting(_))
    }

    /// The store filter that produces this aggregate's contents.
    pub fn filter(&self) -> SettingsFilter {
        match self {
            CacheKey::Setting(key) => SettingsFilter::keys(vec![key.to_string()]),
            CacheKey::Category(category) => SettingsFilter::category(*category),
            CacheKey::Public => SettingsFilter::public(),
            CacheKey::All => SettingsFilter::all(),
        }
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Setting(key) => write!(f, "{PREFIX}:{key}"),
            CacheKey::Category(category) => write!(f, "{PREFIX}:category:{category}"),
            CacheKey::Public => write!(f, "{PREFIX}:public"),
            CacheKey::All => write!(f, "{PREFIX}:all"),
        }
    }
}

/// Raw value plus declared type, as held by both cache tiers.
///
/// Crosses the distributed boundary as `{"value": "...", "type": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePayload {
    pub value: String,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
}

impl CachePayload {
    pub fn new(value: impl Into<String>, setting_type: SettingType) -> Self {
        Self {
            value: value.into(),
            setting_type,
        }
    }

    /// Coerce the raw value to its declared type.
    pub fn typed_value(&self) -> Result<SettingValue, CoercionError> {
        coercion::parse(&self.value, self.setting_type)
    }
}

impl From<&Setting> for CachePayload {
    fn from(setting: &Setting) -> Self {
        Self::new(setting.value.clone(), setting.setting_type)
    }
}

/// Contents of an aggregate namespace, keyed by setting key.
pub type SettingsBundle = BTreeMap<String, CachePayload>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(CacheKey::Setting("max_bet_amount").to_string(), "settings:max_bet_amount");
        assert_eq!(CacheKey::Category("betting").to_string(), "settings:category:betting");
        assert_eq!(CacheKey::Public.to_string(), "settings:public");
        assert_eq!(CacheKey::All.to_string(), "settings:all");
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = CachePayload::new("10000", SettingType::Number);
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(text, r#"{"value":"10000","type":"number"}"#);

        let back: CachePayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back.typed_value().unwrap(), SettingValue::from(10000));
    }

    #[test]
    fn test_aggregate_filters() {
        assert!(CacheKey::Public.is_aggregate());
        assert!(!CacheKey::Setting("a").is_aggregate());
        assert_eq!(CacheKey::Category("ui").filter(), SettingsFilter::category("ui"));
    }
}
