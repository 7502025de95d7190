//! Conversion between stored setting text and typed values.
//!
//! - [`parse`]: storage text -> typed value (read path)
//! - [`validate`]: candidate write value -> typed value, rejecting anything
//!   that cannot be coerced to the declared type
//! - [`serialize`]: typed value -> canonical storage text (inverse of `parse`)
//!
//! Coercion never falls back to a default; every failure is a [`CoercionError`].

use serde_json::Value;

use crate::types::{SettingType, SettingValue};

/// A value could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}: {message}")]
pub struct CoercionError {
    pub expected: SettingType,
    pub message: String,
}

impl CoercionError {
    pub fn new(expected: SettingType, message: impl Into<String>) -> Self {
        Self {
            expected,
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: SettingType, actual: SettingType) -> Self {
        Self::new(expected, format!("value has type {actual}"))
    }
}

/// Parse canonical storage text into a typed value.
pub fn parse(raw: &str, setting_type: SettingType) -> Result<SettingValue, CoercionError> {
    match setting_type {
        SettingType::Boolean => parse_bool(raw)
            .map(SettingValue::Bool)
            .ok_or_else(|| CoercionError::new(setting_type, format!("'{raw}' is not a boolean"))),
        SettingType::Number => parse_number(raw).map(SettingValue::Number),
        SettingType::String => Ok(SettingValue::String(raw.to_string())),
        SettingType::Json => serde_json::from_str(raw)
            .map(SettingValue::Json)
            .map_err(|e| CoercionError::new(setting_type, format!("malformed JSON: {e}"))),
    }
}

/// Validate a candidate write value against the declared type.
///
/// Accepted inputs:
/// - boolean: `true`/`false` or the strings `"true"`/`"false"`
/// - number: a JSON number or a numeric string
/// - string: a string, or a number/boolean taken as its text
/// - json: any structured value, or a string that itself parses as JSON
pub fn validate(candidate: &Value, setting_type: SettingType) -> Result<SettingValue, CoercionError> {
    match (setting_type, candidate) {
        (SettingType::Boolean, Value::Bool(b)) => Ok(SettingValue::Bool(*b)),
        (SettingType::Boolean, Value::String(s)) => parse(s, setting_type),

        (SettingType::Number, Value::Number(n)) => Ok(SettingValue::Number(n.clone())),
        (SettingType::Number, Value::String(s)) => parse_number(s.trim()).map(SettingValue::Number),

        (SettingType::String, Value::String(s)) => Ok(SettingValue::String(s.clone())),
        (SettingType::String, Value::Number(n)) => Ok(SettingValue::String(n.to_string())),
        (SettingType::String, Value::Bool(b)) => Ok(SettingValue::String(b.to_string())),

        (SettingType::Json, Value::String(s)) => parse(s, setting_type),
        (SettingType::Json, other) => Ok(SettingValue::Json(other.clone())),

        (_, other) => Err(CoercionError::new(
            setting_type,
            format!("cannot coerce {} value", json_kind(other)),
        )),
    }
}

/// Produce the canonical storage text for a typed value.
pub fn serialize(value: &SettingValue, setting_type: SettingType) -> Result<String, CoercionError> {
    if value.setting_type() != setting_type {
        return Err(CoercionError::type_mismatch(setting_type, value.setting_type()));
    }
    Ok(match value {
        SettingValue::Bool(b) => b.to_string(),
        SettingValue::Number(n) => n.to_string(),
        SettingValue::String(s) => s.clone(),
        SettingValue::Json(v) => v.to_string(),
    })
}

/// Validate then serialize: candidate value -> storage text.
pub fn to_storage(candidate: &Value, setting_type: SettingType) -> Result<String, CoercionError> {
    let value = validate(candidate, setting_type)?;
    serialize(&value, setting_type)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Result<serde_json::Number, CoercionError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(i.into());
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(u.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| CoercionError::new(SettingType::Number, format!("'{raw}' is not a number")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse("true", SettingType::Boolean).unwrap(), SettingValue::Bool(true));
        assert_eq!(parse("false", SettingType::Boolean).unwrap(), SettingValue::Bool(false));
        assert!(parse("yes", SettingType::Boolean).is_err());
    }

    #[test]
    fn test_parse_number_keeps_integers() {
        let value = parse("15000", SettingType::Number).unwrap();
        assert_eq!(value, SettingValue::from(15000));
        assert_eq!(value.as_f64(), Some(15000.0));

        let float = parse("2.5", SettingType::Number).unwrap();
        assert_eq!(float.as_f64(), Some(2.5));

        assert!(parse("abc", SettingType::Number).is_err());
        assert!(parse("NaN", SettingType::Number).is_err());
    }

    #[test]
    fn test_parse_json() {
        let value = parse(r#"{"limits":[1,2]}"#, SettingType::Json).unwrap();
        assert_eq!(value, SettingValue::Json(json!({"limits": [1, 2]})));
        assert!(parse("{not json", SettingType::Json).is_err());
    }

    #[test]
    fn test_validate_boolean_accepts_literal_and_string() {
        assert_eq!(validate(&json!(true), SettingType::Boolean).unwrap(), SettingValue::Bool(true));
        assert_eq!(
            validate(&json!("false"), SettingType::Boolean).unwrap(),
            SettingValue::Bool(false)
        );
        assert!(validate(&json!("nope"), SettingType::Boolean).is_err());
        assert!(validate(&json!(1), SettingType::Boolean).is_err());
    }

    #[test]
    fn test_validate_number_coerces_numeric_string() {
        assert_eq!(
            validate(&json!("15000"), SettingType::Number).unwrap(),
            SettingValue::from(15000)
        );
        assert_eq!(validate(&json!(3), SettingType::Number).unwrap(), SettingValue::from(3));

        let err = validate(&json!("lots"), SettingType::Number).unwrap_err();
        assert_eq!(err.expected, SettingType::Number);
        assert!(validate(&json!(null), SettingType::Number).is_err());
    }

    #[test]
    fn test_validate_json_accepts_structure_or_json_text() {
        assert_eq!(
            validate(&json!({"a": 1}), SettingType::Json).unwrap(),
            SettingValue::Json(json!({"a": 1}))
        );
        assert_eq!(
            validate(&json!("[1,2,3]"), SettingType::Json).unwrap(),
            SettingValue::Json(json!([1, 2, 3]))
        );
        assert!(validate(&json!("not json"), SettingType::Json).is_err());
    }

    #[test]
    fn test_validate_string_rejects_structures() {
        assert_eq!(
            validate(&json!(12), SettingType::String).unwrap(),
            SettingValue::from("12")
        );
        assert!(validate(&json!({"a": 1}), SettingType::String).is_err());
        assert!(validate(&json!(null), SettingType::String).is_err());
    }

    #[test]
    fn test_serialize_is_inverse_of_parse() {
        let cases = [
            ("true", SettingType::Boolean),
            ("-12", SettingType::Number),
            ("0.25", SettingType::Number),
            ("hello world", SettingType::String),
            (r#"{"a":[1,2]}"#, SettingType::Json),
        ];
        for (raw, ty) in cases {
            let parsed = parse(raw, ty).unwrap();
            assert_eq!(serialize(&parsed, ty).unwrap(), raw);
        }
    }

    #[test]
    fn test_serialize_rejects_type_mismatch() {
        let err = serialize(&SettingValue::Bool(true), SettingType::Number).unwrap_err();
        assert_eq!(err, CoercionError::type_mismatch(SettingType::Number, SettingType::Boolean));
    }

    #[test]
    fn test_to_storage() {
        assert_eq!(to_storage(&json!("15000"), SettingType::Number).unwrap(), "15000");
        assert_eq!(to_storage(&json!({"b": true}), SettingType::Json).unwrap(), r#"{"b":true}"#);
    }
}
