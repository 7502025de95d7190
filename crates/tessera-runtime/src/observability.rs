// Tracing initialization with a reloadable log level.
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    install(level, true);
}

/// Install the subscriber from logging configuration.
///
/// Only the first call in a process installs a subscriber; later calls
/// just apply the configured level.
pub fn init_tracing_from_config(logging: &LoggingConfig) {
    if LOG_RELOAD_HANDLE.get().is_some() {
        apply_logging_level(&logging.level);
        return;
    }
    install(&logging.level, logging.ansi);
}

fn install(level: &str, ansi: bool) {
    // RUST_LOG wins over the configured level.
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (reload_layer, handle) = reload::Layer::new(base_filter);
    if LOG_RELOAD_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer().with_ansi(ansi).with_target(true))
        .try_init();
}

/// Apply a new logging level at runtime if the subscriber is installed.
pub fn apply_logging_level(level: &str) {
    if let Some(handle) = LOG_RELOAD_HANDLE.get() {
        let _ = handle.modify(|f| {
            *f = EnvFilter::new(level);
        });
    }
}
