//! In-memory settings store for Tessera.
//!
//! Implements [`SettingsStore`] over a `DashMap`, for development and tests.
//!
//! # Example
//!
//! ```ignore
//! use tessera_db_memory::InMemorySettingsStore;
//! use tessera_core::SettingsStore;
//!
//! let store = InMemorySettingsStore::new();
//! let found = store.find_by_key("maintenance_mode").await?;
//! ```

mod storage;

pub use storage::InMemorySettingsStore;

/// Creates a new, empty, shareable in-memory store.
pub fn create_settings_store() -> tessera_core::DynSettingsStore {
    std::sync::Arc::new(InMemorySettingsStore::new())
}
