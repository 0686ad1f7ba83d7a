//! Entity model over the topology store.
//!
//! Entities are cheap scoped views: a name plus optional parent references.
//! Queries always read fresh rows and return newly built entities, so callers
//! must not rely on identity across calls. Operations that need a parent
//! reference fail with [`Error::NotSelected`] when it is unset.

mod device;
mod node;
mod partition;
mod pool;
mod poolmember;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

pub use device::Device;
pub use node::Node;
pub use partition::Partition;
pub use pool::Pool;
pub use poolmember::Poolmember;

use crate::adapter::outbound::sqlite::{Field, MemberFilter, TopologyStore};
use crate::application::device_pool::DevicePool;
use crate::domain::{MembershipChange, PartitionName, PoolName};
use crate::error::{Error, Result};

/// Entry point for building scoped entities.
#[derive(Clone)]
pub struct Inventory {
    store: TopologyStore,
    devices: Arc<DevicePool>,
}

/// Result of enabling or disabling one node through [`Inventory::apply_change`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeOutcome {
    pub node: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl Inventory {
    #[must_use]
    pub fn new(store: TopologyStore, devices: Arc<DevicePool>) -> Self {
        Self { store, devices }
    }

    #[must_use]
    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    #[must_use]
    pub fn device_pool(&self) -> &Arc<DevicePool> {
        &self.devices
    }

    pub fn device(&self, hostname: impl Into<String>) -> Device {
        Device::new(self.clone(), hostname.into())
    }

    pub fn partition(&self, name: impl Into<String>) -> Result<Partition> {
        Ok(Partition::new(self.clone(), PartitionName::parse(name)?))
    }

    pub fn pool(&self, name: impl Into<String>) -> Result<Pool> {
        Ok(Pool::new(self.clone(), PoolName::parse(name)?))
    }

    pub fn poolmember(&self, name: impl Into<String>) -> Poolmember {
        Poolmember::new(self.clone(), name.into())
    }

    pub fn node(&self, name: impl Into<String>) -> Node {
        Node::new(self.clone(), name.into())
    }

    /// Every device with at least one recorded pool member.
    pub fn devices(&self) -> Result<Vec<Device>> {
        Ok(self
            .store
            .distinct(Field::Device, MemberFilter::default())?
            .into_iter()
            .map(|hostname| self.device(hostname))
            .collect())
    }

    /// Enable and disable nodes on one device.
    ///
    /// The request is validated as a whole before anything is written. Each
    /// node is then processed independently; a failing node is reported in
    /// its outcome and does not stop the rest.
    pub async fn apply_change(
        &self,
        device: &str,
        change: &MembershipChange,
    ) -> Result<Vec<NodeOutcome>> {
        change.validate()?;
        if !self.device(device).exists()? {
            return Err(Error::NotFound(format!("device {device}")));
        }

        let mut outcomes = Vec::new();
        for (name, enabled) in change.targets() {
            let node = self.node(name).with_device(device);
            let error = match node.set_enabled(enabled).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(device = %device, node = %name, error = %err, "Node change failed");
                    Some(err.to_string())
                }
            };
            outcomes.push(NodeOutcome {
                node: name.to_string(),
                enabled,
                error,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(device = %device, nodes = outcomes.len(), failed, "Membership change applied");
        Ok(outcomes)
    }
}

/// Stored names were validated when written; a failure here means the table
/// was edited by hand.
fn pool_names(names: impl IntoIterator<Item = String>) -> Result<Vec<PoolName>> {
    names.into_iter().map(PoolName::parse).collect()
}

fn partition_names(names: impl IntoIterator<Item = String>) -> Result<Vec<PartitionName>> {
    names.into_iter().map(PartitionName::parse).collect()
}
