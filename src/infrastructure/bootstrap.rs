//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::icontrol::IControlConnector;
use crate::adapter::outbound::memory::MemoryCacheIndex;
use crate::adapter::outbound::redis::RedisCacheIndex;
use crate::adapter::outbound::sqlite::database::connection::{
    create_pool_with_size, run_migrations,
};
use crate::adapter::outbound::sqlite::TopologyStore;
use crate::application::device_pool::DevicePool;
use crate::application::memo::Memo;
use crate::application::readiness::Readiness;
use crate::application::reconcile::Reconciler;
use crate::application::topology::Inventory;
use crate::error::Result;
use crate::infrastructure::auth::AuthStrategy;
use crate::infrastructure::config::cache::CacheBackend;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::cache::CacheIndex;
use crate::port::outbound::device::DeviceConnector;

/// Fully wired application services.
pub struct App {
    pub config: Config,
    pub reconciler: Reconciler,
    pub memo: Memo,
    pub readiness: Readiness,
    pub auth: AuthStrategy,
}

impl App {
    /// Open the store (running pending migrations), connect the configured
    /// cache backend and build the device connector.
    pub async fn build(config: Config) -> Result<Self> {
        let store = open_store(&config)?;
        let cache = connect_cache(&config).await?;
        let connector: Arc<dyn DeviceConnector> =
            Arc::new(IControlConnector::from_config(&config.device)?);
        Self::from_parts(config, store, cache, connector)
    }

    /// Wire services from already-built adapters.
    pub fn from_parts(
        config: Config,
        store: TopologyStore,
        cache: Arc<dyn CacheIndex>,
        connector: Arc<dyn DeviceConnector>,
    ) -> Result<Self> {
        let auth = AuthStrategy::from_config(&config.auth)?;
        let devices = Arc::new(DevicePool::new(connector, config.device.timeout()));
        let inventory = Inventory::new(store, devices);

        Ok(Self {
            reconciler: Reconciler::new(inventory, Arc::clone(&cache)),
            memo: Memo::new(Arc::clone(&cache), config.cache.ttl()),
            readiness: Readiness::new(cache),
            auth,
            config,
        })
    }

    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        self.reconciler.inventory()
    }
}

/// Create the connection pool and bring the schema up to date.
pub fn open_store(config: &Config) -> Result<TopologyStore> {
    let pool = create_pool_with_size(&config.database.url, config.database.pool_size)?;
    run_migrations(&pool)?;
    info!(url = %config.database.url, "Topology store ready");
    Ok(TopologyStore::new(pool))
}

/// Connect the configured cache index backend.
pub async fn connect_cache(config: &Config) -> Result<Arc<dyn CacheIndex>> {
    match config.cache.backend {
        CacheBackend::Redis => Ok(Arc::new(RedisCacheIndex::connect(&config.cache).await?)),
        CacheBackend::Memory => {
            info!("Using in-process cache index");
            Ok(Arc::new(MemoryCacheIndex::new()))
        }
    }
}
