//! Core types for the Tessera settings cache.
//!
//! This crate holds everything the cache tiers and store backends agree on:
//!
//! - [`Setting`] and [`SettingValue`]: the authoritative entity and its typed value
//! - [`coercion`]: conversion between stored text and typed values
//! - [`SettingsStore`] / [`DistributedCache`]: the adapter contracts consumed by the orchestrator
//! - [`CacheKey`] / [`CachePayload`]: cache namespaces and the `{value, type}` wire format
//! - [`SettingsError`]: the error taxonomy surfaced to callers
//!
//! # Example
//!
//! ```
//! use tessera_core::{SettingType, SettingValue, coercion};
//!
//! let value = coercion::validate(&serde_json::json!("15000"), SettingType::Number).unwrap();
//! assert_eq!(value, SettingValue::from(15000));
//! assert_eq!(coercion::serialize(&value, SettingType::Number).unwrap(), "15000");
//! ```

pub mod coercion;
pub mod error;
pub mod keys;
pub mod traits;
pub mod types;

pub use coercion::CoercionError;
pub use error::{DistributedCacheError, Result, SettingsError, StoreError};
pub use keys::{CacheKey, CachePayload, SettingsBundle};
pub use traits::{DistributedCache, DynDistributedCache, DynSettingsStore, SettingsStore};
pub use types::{NewSetting, Setting, SettingType, SettingValue, SettingsFilter, SettingsMap};
