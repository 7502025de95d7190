//! Setting entity and typed values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coercion::{self, CoercionError};

/// Declared type of a setting's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Boolean,
    String,
    Number,
    Json,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::Boolean => "boolean",
            SettingType::String => "string",
            SettingType::Number => "number",
            SettingType::Json => "json",
        }
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(SettingType::Boolean),
            "string" => Ok(SettingType::String),
            "number" => Ok(SettingType::Number),
            "json" => Ok(SettingType::Json),
            other => Err(format!("unknown setting type: {other}")),
        }
    }
}

/// A setting value after coercion to its declared type.
///
/// Numbers keep `serde_json::Number` so integers round-trip without
/// passing through a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Json(serde_json::Value),
}

impl SettingValue {
    /// The declared type this value satisfies.
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingValue::Bool(_) => SettingType::Boolean,
            SettingValue::Number(_) => SettingType::Number,
            SettingValue::String(_) => SettingType::String,
            SettingValue::Json(_) => SettingType::Json,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a plain JSON value (for responses).
    pub fn into_json(self) -> serde_json::Value {
        match self {
            SettingValue::Bool(b) => serde_json::Value::Bool(b),
            SettingValue::Number(n) => serde_json::Value::Number(n),
            SettingValue::String(s) => serde_json::Value::String(s),
            SettingValue::Json(v) => v,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Number(value.into())
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

/// Typed values keyed by setting key, as returned by aggregate lookups.
pub type SettingsMap = BTreeMap<String, SettingValue>;

/// A stored setting row.
///
/// `value` is the canonical storage text produced by [`coercion::serialize`];
/// it always satisfies `setting_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    pub category: String,
    pub is_public: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Parse the stored text into its typed form.
    pub fn typed_value(&self) -> Result<SettingValue, CoercionError> {
        coercion::parse(&self.value, self.setting_type)
    }
}

/// Input for creating a setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSetting {
    pub key: String,
    /// Candidate value; validated against `setting_type` before persisting.
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

impl NewSetting {
    pub fn new(
        key: impl Into<String>,
        setting_type: SettingType,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            setting_type,
            category: default_category(),
            is_public: false,
            description: None,
            updated_by: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn updated_by(mut self, updated_by: impl Into<String>) -> Self {
        self.updated_by = Some(updated_by.into());
        self
    }
}

/// Row filter for `SettingsStore::find_all`. Empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsFilter {
    pub category: Option<String>,
    pub public_only: bool,
    pub keys: Option<Vec<String>>,
}

impl SettingsFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn public() -> Self {
        Self {
            public_only: true,
            ..Default::default()
        }
    }

    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            keys: Some(keys),
            ..Default::default()
        }
    }

    /// Whether a row with the given attributes passes this filter.
    pub fn matches(&self, key: &str, category: &str, is_public: bool) -> bool {
        if self.public_only && !is_public {
            return false;
        }
        if let Some(ref wanted) = self.category
            && wanted != category
        {
            return false;
        }
        self.keys
            .as_ref()
            .is_none_or(|keys| keys.iter().any(|k| k == key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_type_round_trips_through_str() {
        for ty in [
            SettingType::Boolean,
            SettingType::String,
            SettingType::Number,
            SettingType::Json,
        ] {
            assert_eq!(ty.as_str().parse::<SettingType>().unwrap(), ty);
        }
        assert!("float".parse::<SettingType>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        assert!(SettingsFilter::all().matches("a", "general", false));
        assert!(!SettingsFilter::public().matches("a", "general", false));
        assert!(SettingsFilter::category("betting").matches("a", "betting", true));
        assert!(!SettingsFilter::category("betting").matches("a", "general", true));

        let by_keys = SettingsFilter::keys(vec!["a".into(), "b".into()]);
        assert!(by_keys.matches("b", "x", false));
        assert!(!by_keys.matches("c", "x", false));
    }

    #[test]
    fn test_setting_value_serializes_untagged() {
        let json = serde_json::to_value(SettingValue::from(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
        assert_eq!(SettingValue::from(true).into_json(), serde_json::json!(true));
    }
}
