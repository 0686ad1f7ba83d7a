use tracing::debug;

use crate::adapter::outbound::sqlite::{Field, MemberFilter};
use crate::domain::PartitionName;
use crate::error::{Error, Result};

use super::{pool_names, Device, Inventory, Pool, Poolmember};

/// A namespace on a device; groups the pools sharing its first path segment.
#[derive(Clone)]
pub struct Partition {
    inventory: Inventory,
    name: PartitionName,
    device: Option<String>,
}

impl Partition {
    pub(super) fn new(inventory: Inventory, name: PartitionName) -> Self {
        Self {
            inventory,
            name,
            device: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &PartitionName {
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

    fn selected_device(&self) -> Result<&str> {
        self.device.as_deref().ok_or(Error::NotSelected("device"))
    }

    fn scoped(&self) -> Result<MemberFilter<'_>> {
        Ok(MemberFilter::default()
            .device(self.selected_device()?)
            .partition(self.name.as_str()))
    }

    pub fn exists(&self) -> Result<bool> {
        self.inventory.store().any(self.scoped()?)
    }

    pub fn pools(&self) -> Result<Vec<Pool>> {
        let device = self.selected_device()?;
        let names = self.inventory.store().distinct(Field::Pool, self.scoped()?)?;
        Ok(pool_names(names)?
            .into_iter()
            .map(|name| Pool::new(self.inventory.clone(), name).with_device(device))
            .collect())
    }

    /// Nodes with a membership in this partition on the selected device.
    pub fn poolmembers(&self) -> Result<Vec<Poolmember>> {
        let device = self.selected_device()?;
        let names = self
            .inventory
            .store()
            .distinct(Field::Nodename, self.scoped()?)?;
        Ok(names
            .into_iter()
            .map(|name| Poolmember::new(self.inventory.clone(), name).with_device(device))
            .collect())
    }

    /// Devices with at least one pool in this partition.
    pub fn devices(&self) -> Result<Vec<Device>> {
        let filter = MemberFilter::default().partition(self.name.as_str());
        let hostnames = self.inventory.store().distinct(Field::Device, filter)?;
        Ok(hostnames
            .into_iter()
            .map(|hostname| self.inventory.device(hostname))
            .collect())
    }

    /// Remove every membership in this partition on the selected device.
    pub fn delete(&self) -> Result<usize> {
        let device = self.selected_device()?;
        let deleted = self.inventory.store().delete_members(self.scoped()?)?;
        debug!(
            device = %device,
            partition = %self.name,
            deleted,
            "Partition deleted"
        );
        Ok(deleted)
    }
}
