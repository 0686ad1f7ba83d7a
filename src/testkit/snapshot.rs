//! Builders for observed snapshots.

use crate::domain::{ObservedMember, PartitionName, PoolName, Snapshot, VirtualServer};

/// Fluent snapshot builder. Pools and partitions named by members are added
/// automatically.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

/// Start an empty snapshot.
#[must_use]
pub fn snapshot() -> SnapshotBuilder {
    SnapshotBuilder::default()
}

impl SnapshotBuilder {
    #[must_use]
    pub fn virtualserver(mut self, name: &str, address: &str) -> Self {
        self.snapshot
            .virtualservers
            .push(VirtualServer::new(name, address));
        self
    }

    /// Declare a pool, with no members unless [`Self::member`] adds some.
    ///
    /// # Panics
    /// Panics on a name that is not an absolute path.
    #[must_use]
    pub fn pool(mut self, name: &str) -> Self {
        let pool = PoolName::parse(name).expect("valid pool name");
        self.add_pool(pool);
        self
    }

    /// # Panics
    /// Panics on a pool name that is not an absolute path.
    #[must_use]
    pub fn member(mut self, pool: &str, node: &str, port: u16, enabled: bool) -> Self {
        let pool = PoolName::parse(pool).expect("valid pool name");
        self.add_pool(pool.clone());
        self.snapshot
            .poolmembers
            .entry(pool)
            .or_default()
            .push(ObservedMember::new(node, port, enabled));
        self
    }

    #[must_use]
    pub fn orphan(mut self, node: &str) -> Self {
        self.snapshot.nodes.push(node.to_string());
        self
    }

    #[must_use]
    pub fn build(self) -> Snapshot {
        self.snapshot
    }

    fn add_pool(&mut self, pool: PoolName) {
        let partition: PartitionName = pool.partition();
        if !self.snapshot.partitions.contains(&partition) {
            self.snapshot.partitions.push(partition);
        }
        if !self.snapshot.pools.contains(&pool) {
            self.snapshot.pools.push(pool.clone());
        }
        self.snapshot.poolmembers.entry(pool).or_default();
    }
}
