use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_cache::{CachePolicy, RedisConfig};
use tessera_db_postgres::PostgresConfig;

const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Authoritative store. Absent selects the in-memory store.
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TesseraConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Cache validations
        let c = &self.cache;
        for (name, secs) in [
            ("cache.local_ttl_secs", c.local_ttl_secs),
            ("cache.key_ttl_secs", c.key_ttl_secs),
            ("cache.category_ttl_secs", c.category_ttl_secs),
            ("cache.public_ttl_secs", c.public_ttl_secs),
            ("cache.all_ttl_secs", c.all_ttl_secs),
            ("cache.defaults_ttl_secs", c.defaults_ttl_secs),
            ("cache.flag_ttl_secs", c.flag_ttl_secs),
            ("cache.sweep_interval_secs", c.sweep_interval_secs),
        ] {
            if secs == 0 {
                return Err(format!("{name} must be > 0"));
            }
        }
        let shortest_aggregate = c
            .category_ttl_secs
            .min(c.public_ttl_secs)
            .min(c.all_ttl_secs);
        if c.defaults_ttl_secs > shortest_aggregate {
            return Err(
                "cache.defaults_ttl_secs must be <= every aggregate ttl (category, public, all)"
                    .into(),
            );
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {VALID_LOG_LEVELS:?}"));
        }
        // Redis validation
        if self.redis.enabled {
            if self.redis.url.is_empty() {
                return Err("redis.enabled=true requires redis.url".into());
            }
            if self.redis.timeout_ms == 0 {
                return Err("redis.timeout_ms must be > 0".into());
            }
        }
        // Storage validation
        if let Some(ref pg) = self.postgres {
            pg.validate()?;
        }
        Ok(())
    }
}

/// TTLs for every cache namespace, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_local_ttl_secs")]
    pub local_ttl_secs: u64,
    #[serde(default = "default_key_ttl_secs")]
    pub key_ttl_secs: u64,
    #[serde(default = "default_category_ttl_secs")]
    pub category_ttl_secs: u64,
    #[serde(default = "default_public_ttl_secs")]
    pub public_ttl_secs: u64,
    #[serde(default = "default_all_ttl_secs")]
    pub all_ttl_secs: u64,
    /// Lifetime of the built-in default bundle served when the store is empty.
    #[serde(default = "default_defaults_ttl_secs")]
    pub defaults_ttl_secs: u64,
    #[serde(default = "default_flag_ttl_secs")]
    pub flag_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_local_ttl_secs() -> u64 {
    300
}

fn default_key_ttl_secs() -> u64 {
    300
}

fn default_category_ttl_secs() -> u64 {
    300
}

fn default_public_ttl_secs() -> u64 {
    600
}

fn default_all_ttl_secs() -> u64 {
    900
}

fn default_defaults_ttl_secs() -> u64 {
    60
}

fn default_flag_ttl_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_ttl_secs: default_local_ttl_secs(),
            key_ttl_secs: default_key_ttl_secs(),
            category_ttl_secs: default_category_ttl_secs(),
            public_ttl_secs: default_public_ttl_secs(),
            all_ttl_secs: default_all_ttl_secs(),
            defaults_ttl_secs: default_defaults_ttl_secs(),
            flag_ttl_secs: default_flag_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            local_ttl: Duration::from_secs(self.local_ttl_secs),
            key_ttl: Duration::from_secs(self.key_ttl_secs),
            category_ttl: Duration::from_secs(self.category_ttl_secs),
            public_ttl: Duration::from_secs(self.public_ttl_secs),
            all_ttl: Duration::from_secs(self.all_ttl_secs),
            defaults_ttl: Duration::from_secs(self.defaults_ttl_secs),
            flag_ttl: Duration::from_secs(self.flag_ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Colored output. Disable when logs are shipped to a collector.
    #[serde(default = "default_log_ansi")]
    pub ansi: bool,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_ansi() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: default_log_ansi(),
        }
    }
}

pub mod loader {
    use super::TesseraConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_PATH: &str = "tessera.toml";

    /// Layer the TOML file at `path` (or `tessera.toml`) under
    /// `TESSERA__SECTION__FIELD` environment overrides, then validate.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_config(path: Option<&str>) -> Result<TesseraConfig, String> {
        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        // Environment variable overrides, e.g., TESSERA__CACHE__FLAG_TTL_SECS=10
        builder = builder.add_source(
            Environment::with_prefix("TESSERA")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: TesseraConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<TesseraConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TesseraConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.postgres.is_none());
        assert_eq!(config.cache.policy(), CachePolicy::default());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = TesseraConfig::default();
        config.cache.flag_ttl_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("cache.flag_ttl_secs"));
    }

    #[test]
    fn test_defaults_ttl_must_not_outlive_aggregates() {
        let mut config = TesseraConfig::default();
        config.cache.defaults_ttl_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = TesseraConfig::default();
        config.logging.level = "verbose".into();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_redis_requires_url() {
        let mut config = TesseraConfig::default();
        config.redis.enabled = true;
        config.redis.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_validation() {
        let mut config = TesseraConfig {
            postgres: Some(PostgresConfig::new("postgres://localhost/tessera")),
            ..TesseraConfig::default()
        };
        assert!(config.validate().is_ok());

        config.postgres = Some(PostgresConfig {
            max_connections: 0,
            ..PostgresConfig::new("postgres://localhost/tessera")
        });
        let err = config.validate().unwrap_err();
        assert!(err.contains("postgres.max_connections"));
    }
}
