use tracing::debug;

use crate::adapter::outbound::sqlite::{Field, MemberFilter};
use crate::error::{Error, Result};

use super::{partition_names, pool_names, Device, Inventory, Partition, Pool, Poolmember};

/// A backend host, possibly a member of several pools on the same device.
#[derive(Clone)]
pub struct Node {
    inventory: Inventory,
    name: String,
    device: Option<String>,
    skip_f5: bool,
}

impl Node {
    pub(super) fn new(inventory: Inventory, name: String) -> Self {
        Self {
            inventory,
            name,
            device: None,
            skip_f5: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    #[must_use]
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    #[must_use]
    pub fn skip_f5(&self) -> bool {
        self.skip_f5
    }

    pub fn set_skip_f5(&mut self, skip: bool) {
        self.skip_f5 = skip;
    }

    fn selected_device(&self) -> Result<&str> {
        self.device.as_deref().ok_or(Error::NotSelected("device"))
    }

    fn ensure_exists(&self) -> Result<&str> {
        let device = self.selected_device()?;
        if self.exists()? {
            Ok(device)
        } else {
            Err(Error::NotFound(format!("node {device}/{}", self.name)))
        }
    }

    /// Whether the node has any membership on the selected device.
    pub fn exists(&self) -> Result<bool> {
        let filter = MemberFilter::default()
            .device(self.selected_device()?)
            .nodename(&self.name);
        self.inventory.store().any(filter)
    }

    /// Enabled flag as observed on the live device.
    pub async fn enabled(&self) -> Result<bool> {
        let device = self.ensure_exists()?;
        self.inventory
            .device_pool()
            .node_enabled(device, &self.name)
            .await
    }

    /// Enable or disable the node in every pool on the selected device, then
    /// the device-level node object.
    ///
    /// Stops at the first failing membership; earlier memberships keep their
    /// new state. With the bypass flag set nothing is sent to the device.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let device = self.ensure_exists()?;
        let filter = MemberFilter::default().device(device).nodename(&self.name);
        let pools = pool_names(self.inventory.store().distinct(Field::Pool, filter)?)?;

        for pool in pools {
            let mut member = Poolmember::new(self.inventory.clone(), self.name.clone())
                .with_device(device)
                .with_pool(pool);
            member.set_skip_f5(self.skip_f5);
            member.set_enabled(enabled).await?;
        }

        if !self.skip_f5 {
            self.inventory
                .device_pool()
                .set_node_enabled(device, &self.name, enabled)
                .await?;
        }
        debug!(device = %device, node = %self.name, enabled, "Node status applied");
        Ok(())
    }

    fn filter(&self) -> MemberFilter<'_> {
        MemberFilter::default().nodename(&self.name)
    }

    pub fn pools(&self) -> Result<Vec<Pool>> {
        let names = self.inventory.store().distinct(Field::Pool, self.filter())?;
        Ok(pool_names(names)?
            .into_iter()
            .map(|name| Pool::new(self.inventory.clone(), name))
            .collect())
    }

    pub fn devices(&self) -> Result<Vec<Device>> {
        let names = self.inventory.store().distinct(Field::Device, self.filter())?;
        Ok(names
            .into_iter()
            .map(|hostname| self.inventory.device(hostname))
            .collect())
    }

    pub fn partitions(&self) -> Result<Vec<Partition>> {
        let names = self
            .inventory
            .store()
            .distinct(Field::Partition, self.filter())?;
        Ok(partition_names(names)?
            .into_iter()
            .map(|name| Partition::new(self.inventory.clone(), name))
            .collect())
    }
}
