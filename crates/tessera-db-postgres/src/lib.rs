//! PostgreSQL settings store for Tessera.
//!
//! Persists settings in a single `settings` table keyed by setting key. Values
//! are stored as text in their canonical form alongside the declared type.
//!
//! # Example
//!
//! ```ignore
//! use tessera_db_postgres::{PgSettingsStore, PostgresConfig};
//!
//! let config = PostgresConfig::new("postgres://localhost/tessera");
//! let store = PgSettingsStore::connect(&config).await?;
//! ```

mod config;
mod error;
mod schema;
mod storage;

pub use config::PostgresConfig;
pub use error::{PostgresError, Result, has_pg_error_code, is_unique_violation};
pub use schema::ensure_schema;
pub use storage::PgSettingsStore;
