//! Wires the store, the distributed tier and the sweeper into a running
//! settings cache.

use std::sync::Arc;

use anyhow::Context;
use tessera_cache::{SettingsService, SweeperHandle, create_distributed_cache};
use tessera_core::DynSettingsStore;
use tessera_db_memory::InMemorySettingsStore;
use tessera_db_postgres::PgSettingsStore;
use tracing::{info, warn};

use crate::config::TesseraConfig;

/// Which authoritative store the runtime is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// A started settings cache: the shared service plus its background sweeper.
#[derive(Debug)]
pub struct SettingsRuntime {
    service: Arc<SettingsService>,
    sweeper: Option<SweeperHandle>,
    backend: StoreBackend,
}

impl SettingsRuntime {
    /// Connect the store and distributed tier, then start the sweeper.
    ///
    /// A Postgres connection failure is fatal. A Redis failure is not: the
    /// distributed tier degrades to a no-op.
    pub async fn start(config: &TesseraConfig) -> anyhow::Result<Self> {
        let (store, backend): (DynSettingsStore, StoreBackend) = match &config.postgres {
            Some(pg) => {
                let store = PgSettingsStore::connect(pg)
                    .await
                    .context("failed to connect the PostgreSQL settings store")?;
                (Arc::new(store), StoreBackend::Postgres)
            }
            None => {
                warn!("No postgres section configured, settings are held in memory only");
                (Arc::new(InMemorySettingsStore::new()), StoreBackend::Memory)
            }
        };

        Ok(Self::with_store(config, store, backend).await)
    }

    /// Start over an already constructed store.
    pub async fn with_store(
        config: &TesseraConfig,
        store: DynSettingsStore,
        backend: StoreBackend,
    ) -> Self {
        let distributed = create_distributed_cache(&config.redis).await;
        let service = SettingsService::builder(store)
            .distributed(distributed)
            .policy(config.cache.policy())
            .build();
        let sweeper = service.start_sweeper();

        info!(
            store = ?backend,
            distributed = %service.stats().distributed,
            sweep_interval_secs = config.cache.sweep_interval_secs,
            "Settings runtime started"
        );

        Self {
            service: Arc::new(service),
            sweeper: Some(sweeper),
            backend,
        }
    }

    pub fn service(&self) -> Arc<SettingsService> {
        Arc::clone(&self.service)
    }

    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.stop().await;
        }
        let stats = self.service.stats();
        info!(
            setting_hits = stats.settings.hits,
            setting_misses = stats.settings.misses,
            flag_hits = stats.flags.hits,
            "Settings runtime stopped"
        );
    }
}
