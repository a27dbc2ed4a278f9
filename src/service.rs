//! Cache Service
//!
//! Bundles an engine with its sweeper so a host can build, start and stop
//! the whole cache from one configuration.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheEngine, CacheStats};
use crate::config::Config;
use crate::error::Result;
use crate::tasks::{SweepReport, Sweeper, SweeperState};

/// Engine plus background sweeper, owned by the host.
pub struct CacheService<V> {
    engine: Arc<CacheEngine<V>>,
    sweeper: Sweeper<V>,
}

impl<V> CacheService<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Validates `config` and builds the configured backend, engine and
    /// (stopped) sweeper.
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine = Arc::new(CacheEngine::from_config(config)?);
        let sweeper = Sweeper::new(Arc::clone(&engine));

        info!(
            backend = %config.backend,
            initial_capacity = config.initial_capacity,
            "Cache service initialized"
        );

        Ok(Self { engine, sweeper })
    }

    /// Shared handle to the engine for callers.
    pub fn engine(&self) -> Arc<CacheEngine<V>> {
        Arc::clone(&self.engine)
    }

    pub fn start(&self) -> Result<()> {
        self.sweeper.start()
    }

    pub async fn stop(&self) {
        self.sweeper.stop().await;
    }

    pub fn sweeper_state(&self) -> SweeperState {
        self.sweeper.state()
    }

    pub async fn sweep_now(&self) -> Result<SweepReport> {
        self.sweeper.run_once().await
    }

    pub fn stats(&self) -> CacheStats {
        self.engine.stats()
    }
}
