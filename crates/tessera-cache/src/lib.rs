//! Tiered settings cache.
//!
//! ## Architecture
//!
//! - **Local tier (DashMap)**: in-process, TTL-bounded, swept in the background
//! - **Distributed tier (Redis)**: shared across instances, per-namespace TTL
//! - **Store**: authoritative, always consulted on a full miss
//! - **Feature flag sub-cache**: short-TTL booleans for per-request checks
//!
//! ## Cache Hierarchy
//!
//! ```text
//! get_setting → local → distributed → store
//!                 ↑          ↑          │
//!                 └──────────┴──backfill┘
//! ```
//!
//! ## Graceful Degradation
//!
//! Distributed-tier failures degrade to the store; feature flags fail open.

pub mod defaults;
pub mod distributed;
pub mod flags;
pub mod local;
pub mod policy;
pub mod service;
pub mod sweeper;

pub use distributed::{
    NoopDistributedCache, RedisConfig, RedisDistributedCache, create_distributed_cache,
};
pub use flags::FeatureFlagCache;
pub use local::{CacheEntry, CacheStats, LocalTier, Sweep};
pub use policy::CachePolicy;
pub use service::{
    BulkUpdateReport, BulkUpdateResult, ServiceStats, SettingsService, SettingsServiceBuilder,
};
pub use sweeper::{MIN_SWEEP_INTERVAL, SweeperHandle};
