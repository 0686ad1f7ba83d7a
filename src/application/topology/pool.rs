use tracing::debug;

use crate::adapter::outbound::sqlite::{Field, MemberFilter};
use crate::domain::{PartitionName, PoolName};
use crate::error::{Error, Result};

use super::{Device, Inventory, Poolmember};

/// A group of pool members. Its partition is always derived from its name.
#[derive(Clone)]
pub struct Pool {
    inventory: Inventory,
    name: PoolName,
    device: Option<String>,
}

impl Pool {
    pub(super) fn new(inventory: Inventory, name: PoolName) -> Self {
        Self {
            inventory,
            name,
            device: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &PoolName {
        &self.name
    }

    #[must_use]
    pub fn partition(&self) -> PartitionName {
        self.name.partition()
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
            .pool(self.name.as_str()))
    }

    pub fn exists(&self) -> Result<bool> {
        self.inventory.store().any(self.scoped()?)
    }

    /// Members of this pool on the selected device.
    pub fn poolmembers(&self) -> Result<Vec<Poolmember>> {
        let device = self.selected_device()?;
        let names = self
            .inventory
            .store()
            .distinct(Field::Nodename, self.scoped()?)?;
        Ok(names
            .into_iter()
            .map(|name| {
                Poolmember::new(self.inventory.clone(), name)
                    .with_device(device)
                    .with_pool(self.name.clone())
            })
            .collect())
    }

    /// Members of any pool with this name, across all devices.
    pub fn all_poolmembers(&self) -> Result<Vec<Poolmember>> {
        let filter = MemberFilter::default().pool(self.name.as_str());
        let names = self.inventory.store().distinct(Field::Nodename, filter)?;
        Ok(names
            .into_iter()
            .map(|name| Poolmember::new(self.inventory.clone(), name).with_pool(self.name.clone()))
            .collect())
    }

    /// Devices carrying this pool, each with the pool selected.
    pub fn devices(&self) -> Result<Vec<Device>> {
        let filter = MemberFilter::default().pool(self.name.as_str());
        let hostnames = self.inventory.store().distinct(Field::Device, filter)?;
        Ok(hostnames
            .into_iter()
            .map(|hostname| self.inventory.device(hostname).with_pool(self.name.clone()))
            .collect())
    }

    /// Remove every membership of this pool on the selected device.
    pub fn delete(&self) -> Result<usize> {
        let device = self.selected_device()?;
        let deleted = self.inventory.store().delete_members(self.scoped()?)?;
        debug!(device = %device, pool = %self.name, deleted, "Pool deleted");
        Ok(deleted)
    }
}
