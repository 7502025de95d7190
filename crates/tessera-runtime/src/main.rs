use std::env;

use tessera_runtime::SettingsRuntime;
use tessera_runtime::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use tessera_runtime::observability::{init_tracing, init_tracing_from_config};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    init_tracing();

    let config_path = resolve_config_path();
    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    init_tracing_from_config(&cfg.logging);
    tracing::info!(path = %config_path, "Configuration loaded");

    let runtime = match SettingsRuntime::start(&cfg).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Startup failed: {e:#}");
            std::process::exit(2);
        }
    };

    let service = runtime.service();
    match service.get_public_settings().await {
        Ok(public) => tracing::info!(count = public.len(), "Public settings warmed"),
        Err(e) => tracing::warn!(error = %e, "Failed to warm public settings"),
    }

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");

    runtime.shutdown().await;
}

/// `--config <path>`, then `TESSERA_CONFIG`, then `tessera.toml`.
fn resolve_config_path() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|a| a == "--config")
        && let Some(path) = args.get(pos + 1)
    {
        return path.clone();
    }
    env::var("TESSERA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
