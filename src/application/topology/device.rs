use crate::adapter::outbound::sqlite::{Field, MemberFilter};
use crate::domain::{PartitionName, PoolName};
use crate::error::{Error, Result};

use super::{partition_names, pool_names, Inventory, Partition, Pool, Poolmember};

/// A managed appliance, optionally with a pool selected.
#[derive(Clone)]
pub struct Device {
    inventory: Inventory,
    hostname: String,
    pool: Option<PoolName>,
}

impl Device {
    pub(super) fn new(inventory: Inventory, hostname: String) -> Self {
        Self {
            inventory,
            hostname,
            pool: None,
        }
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PoolName> {
        self.pool.as_ref()
    }

    /// Partition of the selected pool.
    #[must_use]
    pub fn partition(&self) -> Option<PartitionName> {
        self.pool.as_ref().map(PoolName::partition)
    }

    /// Bind a pool; the partition follows from it.
    pub fn select_pool(&mut self, pool: Option<PoolName>) {
        self.pool = pool;
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolName) -> Self {
        self.pool = Some(pool);
        self
    }

    fn filter(&self) -> MemberFilter<'_> {
        MemberFilter::default().device(&self.hostname)
    }

    pub fn exists(&self) -> Result<bool> {
        self.inventory.store().any(self.filter())
    }

    pub fn pools(&self) -> Result<Vec<Pool>> {
        let names = self.inventory.store().distinct(Field::Pool, self.filter())?;
        Ok(pool_names(names)?
            .into_iter()
            .map(|name| Pool::new(self.inventory.clone(), name).with_device(&self.hostname))
            .collect())
    }

    pub fn partitions(&self) -> Result<Vec<Partition>> {
        let names = self
            .inventory
            .store()
            .distinct(Field::Partition, self.filter())?;
        Ok(partition_names(names)?
            .into_iter()
            .map(|name| Partition::new(self.inventory.clone(), name).with_device(&self.hostname))
            .collect())
    }

    /// Members of the selected pool.
    pub fn poolmembers(&self) -> Result<Vec<Poolmember>> {
        let pool = self.pool.as_ref().ok_or(Error::NotSelected("pool"))?;
        let filter = self.filter().pool(pool.as_str());
        let names = self.inventory.store().distinct(Field::Nodename, filter)?;
        Ok(names
            .into_iter()
            .map(|name| {
                Poolmember::new(self.inventory.clone(), name)
                    .with_device(&self.hostname)
                    .with_pool(pool.clone())
            })
            .collect())
    }

    /// Every node with a membership on this device, regardless of pool.
    pub fn all_poolmembers(&self) -> Result<Vec<Poolmember>> {
        let names = self
            .inventory
            .store()
            .distinct(Field::Nodename, self.filter())?;
        Ok(names
            .into_iter()
            .map(|name| Poolmember::new(self.inventory.clone(), name).with_device(&self.hostname))
            .collect())
    }
}
