//! Configuration, tracing and startup for the Tessera settings cache.
//!
//! ```ignore
//! let cfg = tessera_runtime::config::loader::load_config(None)?;
//! tessera_runtime::observability::init_tracing_from_config(&cfg.logging);
//! let runtime = tessera_runtime::SettingsRuntime::start(&cfg).await?;
//! let enabled = runtime.service().is_feature_enabled("live_chat_enabled").await;
//! runtime.shutdown().await;
//! ```

pub mod bootstrap;
pub mod config;
pub mod observability;

pub use bootstrap::{SettingsRuntime, StoreBackend};
pub use config::{CacheConfig, LoggingConfig, TesseraConfig};
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
