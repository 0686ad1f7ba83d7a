use tracing::debug;

use crate::adapter::outbound::sqlite::database::model::{PoolmemberRow, PropertyRow};
use crate::adapter::outbound::sqlite::{Field, MemberFilter, MemberKey};
use crate::domain::{PartitionName, PoolName};
use crate::error::{Error, Result};

use super::{partition_names, pool_names, Device, Inventory, Partition, Pool};

fn stored_port(property: &PropertyRow) -> Result<u16> {
    u16::try_from(property.port)
        .map_err(|_| Error::Database(format!("invalid port {} stored", property.port)))
}

/// One node's membership in one pool on one device.
#[derive(Clone)]
pub struct Poolmember {
    inventory: Inventory,
    name: String,
    device: Option<String>,
    pool: Option<PoolName>,
    skip_f5: bool,
}

impl Poolmember {
    pub(super) fn new(inventory: Inventory, name: String) -> Self {
        Self {
            inventory,
            name,
            device: None,
            pool: None,
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
    pub fn pool(&self) -> Option<&PoolName> {
        self.pool.as_ref()
    }

    /// Partition of the selected pool.
    #[must_use]
    pub fn partition(&self) -> Option<PartitionName> {
        self.pool.as_ref().map(PoolName::partition)
    }

    #[must_use]
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolName) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn select_pool(&mut self, pool: PoolName) {
        self.pool = Some(pool);
    }

    /// Whether enabled-writes stay off the live device.
    #[must_use]
    pub fn skip_f5(&self) -> bool {
        self.skip_f5
    }

    pub fn set_skip_f5(&mut self, skip: bool) {
        self.skip_f5 = skip;
    }

    fn scope(&self) -> Result<(&str, &PoolName, PartitionName)> {
        let device = self.device.as_deref().ok_or(Error::NotSelected("device"))?;
        let pool = self.pool.as_ref().ok_or(Error::NotSelected("pool"))?;
        Ok((device, pool, pool.partition()))
    }

    fn describe(&self) -> String {
        format!(
            "poolmember {}/{}/{}",
            self.device.as_deref().unwrap_or_default(),
            self.pool.as_ref().map(PoolName::as_str).unwrap_or_default(),
            self.name
        )
    }

    fn row(&self) -> Result<Option<PoolmemberRow>> {
        let (device, pool, partition) = self.scope()?;
        self.inventory.store().find_member(&MemberKey {
            device,
            partition: partition.as_str(),
            pool: pool.as_str(),
            nodename: &self.name,
        })
    }

    /// Identity row and its property row; either missing is `NotFound`.
    fn record(&self) -> Result<(PoolmemberRow, PropertyRow)> {
        let row = self
            .row()?
            .ok_or_else(|| Error::NotFound(self.describe()))?;
        let property = self
            .inventory
            .store()
            .property(row.id)?
            .ok_or_else(|| Error::NotFound(format!("properties of {}", self.describe())))?;
        Ok((row, property))
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.row()?.is_some())
    }

    /// Record this membership with its port and enabled flag.
    pub fn create(&self, port: u16, status: bool) -> Result<()> {
        let (device, pool, partition) = self.scope()?;
        let key = MemberKey {
            device,
            partition: partition.as_str(),
            pool: pool.as_str(),
            nodename: &self.name,
        };
        self.inventory.store().insert_member(&key, port, status)?;
        Ok(())
    }

    /// Remove this membership and its properties.
    pub fn delete(&self) -> Result<usize> {
        let (device, pool, partition) = self.scope()?;
        let filter = MemberFilter::default()
            .device(device)
            .partition(partition.as_str())
            .pool(pool.as_str())
            .nodename(&self.name);
        let deleted = self.inventory.store().delete_members(filter)?;
        debug!(member = %self.describe(), deleted, "Poolmember deleted");
        Ok(deleted)
    }

    pub fn port(&self) -> Result<u16> {
        let (_, property) = self.record()?;
        stored_port(&property)
    }

    /// Stored enabled flag.
    pub fn enabled(&self) -> Result<bool> {
        let (_, property) = self.record()?;
        Ok(property.status)
    }

    /// Store the enabled flag, then push it to the device unless bypassed.
    ///
    /// The store write is committed before the device is contacted and is
    /// kept when the device call fails.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let (device, pool, _) = self.scope()?;
        let (row, property) = self.record()?;
        self.inventory.store().set_status(row.id, enabled)?;
        debug!(member = %self.describe(), enabled, "Poolmember status stored");

        if self.skip_f5 {
            return Ok(());
        }

        let port = stored_port(&property)?;
        self.inventory
            .device_pool()
            .set_poolmember_enabled(device, &self.name, port, pool.as_str(), enabled)
            .await
    }

    fn filter(&self) -> MemberFilter<'_> {
        MemberFilter::default().nodename(&self.name)
    }

    /// Pools containing this node on any device.
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
