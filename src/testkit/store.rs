//! Ready-to-use stores and inventories backed by in-memory SQLite.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::TopologyStore;
use crate::application::device_pool::DevicePool;
use crate::application::topology::Inventory;

use super::device::RecordingConnector;

/// Call timeout used by test device pools.
pub const CALL_TIMEOUT: Duration = Duration::from_millis(500);

/// Migrated in-memory topology store.
///
/// # Panics
/// Panics if the database cannot be created.
#[must_use]
pub fn memory_store() -> TopologyStore {
    let pool = create_pool(":memory:").expect("create in-memory pool");
    run_migrations(&pool).expect("run migrations");
    TopologyStore::new(pool)
}

/// Inventory over a fresh store, talking to a recording fake device.
#[must_use]
pub fn inventory() -> (Inventory, RecordingConnector) {
    let connector = RecordingConnector::new();
    let devices = DevicePool::new(Arc::new(connector.clone()), CALL_TIMEOUT);
    (Inventory::new(memory_store(), Arc::new(devices)), connector)
}
