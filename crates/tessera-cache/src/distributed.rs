//! Distributed cache tier implementations (Redis and no-op).
//!
//! ## Graceful Degradation
//!
//! If Redis is disabled or unreachable at startup, [`create_distributed_cache`]
//! falls back to [`NoopDistributedCache`], which always misses. Failures after
//! startup surface as [`DistributedCacheError`] and are treated as misses by the
//! orchestrator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tessera_core::{DistributedCache, DistributedCacheError, DynDistributedCache};

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it)
    /// Default: false (local tier only)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Per-operation timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    250
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Redis-backed [`DistributedCache`].
///
/// Every call is bounded by the configured timeout so a slow Redis degrades
/// reads to the store instead of stalling them.
#[derive(Clone)]
pub struct RedisDistributedCache {
    pool: Pool,
    timeout: Duration,
}

impl RedisDistributedCache {
    pub fn new(pool: Pool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, DistributedCacheError> {
        self.bounded(async {
            self.pool
                .get()
                .await
                .map_err(|e| DistributedCacheError::Connection(e.to_string()))
        })
        .await
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, DistributedCacheError>
    where
        F: std::future::Future<Output = Result<T, DistributedCacheError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DistributedCacheError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl DistributedCache for RedisDistributedCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DistributedCacheError> {
        let mut conn = self.connection().await?;
        self.bounded(async {
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(|e| DistributedCacheError::Command(e.to_string()))
        })
        .await
    }

    async fn set(
        &self,
        key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), DistributedCacheError> {
        // SET EX rejects a zero expiry.
        let ttl_secs = ttl.as_secs().max(1);
        let mut conn = self.connection().await?;
        self.bounded(async {
            conn.set_ex::<_, _, ()>(key, payload, ttl_secs)
                .await
                .map_err(|e| DistributedCacheError::Command(e.to_string()))
        })
        .await?;
        tracing::debug!(key = %key, ttl_secs, "distributed cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DistributedCacheError> {
        let mut conn = self.connection().await?;
        self.bounded(async {
            conn.del::<_, ()>(key)
                .await
                .map_err(|e| DistributedCacheError::Command(e.to_string()))
        })
        .await
    }

    async fn is_available(&self) -> bool {
        self.connection().await.is_ok()
    }
}

impl std::fmt::Debug for RedisDistributedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDistributedCache")
            .field("pool", &"<Pool>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A distributed tier that holds nothing. Used when Redis is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDistributedCache;

#[async_trait]
impl DistributedCache for NoopDistributedCache {
    fn name(&self) -> &str {
        "noop"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, DistributedCacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _payload: &str,
        _ttl: Duration,
    ) -> Result<(), DistributedCacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), DistributedCacheError> {
        Ok(())
    }

    async fn is_available(&self) -> bool {
        false
    }
}

/// Create the distributed tier from configuration.
///
/// - **Redis disabled**: returns [`NoopDistributedCache`]
/// - **Redis enabled**: connects, falling back to the no-op tier on failure
pub async fn create_distributed_cache(config: &RedisConfig) -> DynDistributedCache {
    if !config.enabled {
        tracing::info!("Redis disabled, using local cache tier only");
        return Arc::new(NoopDistributedCache);
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let timeout = Duration::from_millis(config.timeout_ms);
    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let pool_config = redis_config
        .pool
        .get_or_insert_with(deadpool_redis::PoolConfig::default);
    pool_config.max_size = config.pool_size;
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache tier."
            );
            return Arc::new(NoopDistributedCache);
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");
            Arc::new(RedisDistributedCache::new(pool, timeout))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache tier."
            );
            Arc::new(NoopDistributedCache)
        }
    }
}
