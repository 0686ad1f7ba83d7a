//! Point-in-time observation of one device, as handed over by the poller.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::name::{PartitionName, PoolName};

/// A virtual server and the address it listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServer {
    pub name: String,
    pub address: String,
}

impl VirtualServer {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// A pool member as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedMember {
    pub name: String,
    pub port: u16,
    pub enabled: bool,
}

impl ObservedMember {
    pub fn new(name: impl Into<String>, port: u16, enabled: bool) -> Self {
        Self {
            name: name.into(),
            port,
            enabled,
        }
    }
}

/// Everything the poller observed on a device in one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub virtualservers: Vec<VirtualServer>,
    #[serde(default)]
    pub partitions: Vec<PartitionName>,
    #[serde(default)]
    pub pools: Vec<PoolName>,
    /// Members per pool. A pool present with an empty list has no members.
    #[serde(default)]
    pub poolmembers: BTreeMap<PoolName, Vec<ObservedMember>>,
    /// Candidate orphan node names.
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    #[must_use]
    pub fn virtualserver_names(&self) -> BTreeSet<String> {
        self.virtualservers.iter().map(|vs| vs.name.clone()).collect()
    }

    /// Every pool the device reports, whether listed on its own or only as a
    /// key of [`Self::poolmembers`].
    #[must_use]
    pub fn pool_names(&self) -> BTreeSet<PoolName> {
        self.pools
            .iter()
            .chain(self.poolmembers.keys())
            .cloned()
            .collect()
    }

    /// Listed partitions plus the partition of every reported pool.
    #[must_use]
    pub fn partition_names(&self) -> BTreeSet<PartitionName> {
        let mut partitions: BTreeSet<PartitionName> = self.partitions.iter().cloned().collect();
        partitions.extend(self.pool_names().iter().map(PoolName::partition));
        partitions
    }

    /// Observed members of `pool`; a pool with no entry has none.
    #[must_use]
    pub fn members_of(&self, pool: &PoolName) -> &[ObservedMember] {
        self.poolmembers.get(pool).map_or(&[][..], Vec::as_slice)
    }

    /// Names of every node that belongs to at least one observed pool.
    #[must_use]
    pub fn member_names(&self) -> BTreeSet<String> {
        self.poolmembers
            .values()
            .flatten()
            .map(|member| member.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_poller_json() {
        let json = r#"{
            "virtualservers": [{"name": "vsA", "address": "10.0.0.1"}],
            "partitions": ["/P"],
            "pools": ["/P/poolA"],
            "poolmembers": {"/P/poolA": [{"name": "/P/nodeX", "port": 80, "enabled": true}]},
            "nodes": ["/P/nodeX", "/P/nodeY"]
        }"#;

        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.virtualservers, vec![VirtualServer::new("vsA", "10.0.0.1")]);
        let pool = PoolName::parse("/P/poolA").unwrap();
        assert_eq!(snapshot.poolmembers[&pool][0].port, 80);
        assert_eq!(snapshot.nodes.len(), 2);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn invalid_pool_key_is_rejected() {
        let json = r#"{"poolmembers": {"poolA": []}}"#;
        assert!(Snapshot::from_json(json).is_err());
    }

    #[test]
    fn pools_and_partitions_follow_reported_members() {
        let json = r#"{
            "pools": ["/Q/db"],
            "poolmembers": {"/P/poolA": [{"name": "nodeX", "port": 80, "enabled": true}]}
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();

        let pools: Vec<String> = snapshot.pool_names().iter().map(|p| p.to_string()).collect();
        assert_eq!(pools, vec!["/P/poolA", "/Q/db"]);
        let partitions: Vec<String> = snapshot
            .partition_names()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(partitions, vec!["/P", "/Q"]);

        assert!(snapshot.members_of(&PoolName::parse("/Q/db").unwrap()).is_empty());
        assert_eq!(snapshot.members_of(&PoolName::parse("/P/poolA").unwrap()).len(), 1);
    }

    #[test]
    fn member_names_are_deduplicated() {
        let mut snapshot = Snapshot::default();
        snapshot.poolmembers.insert(
            PoolName::parse("/P/a").unwrap(),
            vec![ObservedMember::new("/P/n1", 80, true)],
        );
        snapshot.poolmembers.insert(
            PoolName::parse("/P/b").unwrap(),
            vec![
                ObservedMember::new("/P/n1", 443, true),
                ObservedMember::new("/P/n2", 80, false),
            ],
        );
        let names: Vec<_> = snapshot.member_names().into_iter().collect();
        assert_eq!(names, vec!["/P/n1".to_string(), "/P/n2".to_string()]);
    }
}
