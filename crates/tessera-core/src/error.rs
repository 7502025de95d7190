//! Error types for settings operations.
//!
//! Callers only ever see [`SettingsError`]. Adapter-level failures
//! ([`StoreError`], [`DistributedCacheError`]) are converted at the
//! orchestrator boundary; distributed-tier failures are recovered there and
//! never reach the caller.

use crate::coercion::CoercionError;

/// Errors surfaced by the settings orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The setting key does not exist in the authoritative store.
    #[error("Setting not found: {key}")]
    NotFound { key: String },

    /// A value could not be coerced to the setting's declared type.
    #[error("Invalid value for setting '{key}': {source}")]
    Validation {
        key: String,
        #[source]
        source: CoercionError,
    },

    /// A setting with this key already exists.
    #[error("Setting already exists: {key}")]
    Conflict { key: String },

    /// The distributed cache tier failed. Recovered by falling through to
    /// the next tier; only used for logging.
    #[error("Cache tier unavailable: {0}")]
    TierUnavailable(#[from] DistributedCacheError),

    /// The authoritative store failed. No deeper fallback exists.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl SettingsError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn validation(key: impl Into<String>, source: CoercionError) -> Self {
        Self::Validation {
            key: key.into(),
            source,
        }
    }

    pub fn conflict(key: impl Into<String>) -> Self {
        Self::Conflict { key: key.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<StoreError> for SettingsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key } => SettingsError::Conflict { key },
            other => SettingsError::Store(other),
        }
    }
}

/// Errors produced by authoritative store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Setting already exists: {key}")]
    Conflict { key: String },

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Errors produced by distributed cache adapters.
#[derive(Debug, thiserror::Error)]
pub enum DistributedCacheError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    #[error("command failed: {0}")]
    Command(String),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
