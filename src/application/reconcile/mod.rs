//! Snapshot-driven convergence of the store and the cache index.
//!
//! Each kind (virtual servers, partitions, pools, pool members, orphans) is
//! diffed against the snapshot on its own: desired minus current is added,
//! current minus desired is removed. A kind that fails is recorded in the
//! [`PassReport`] and the pass moves on. Cache writes of one kind go out as
//! one atomic batch; store writes are short per-step transactions, so a
//! failed pass leaves partially converged state for the next pass to finish.
//!
//! Passes for the same device are serialized by a per-device lock.

pub mod keyspace;
mod report;

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use report::{Kind, KindReport, PassReport};

use crate::application::topology::{Inventory, Poolmember};
use crate::domain::{ObservedMember, PoolName, Snapshot};
use crate::error::Result;
use crate::port::outbound::cache::{CacheIndex, CacheOp};

pub struct Reconciler {
    inventory: Inventory,
    cache: Arc<dyn CacheIndex>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> BTreeSet<String> {
    items.iter().map(|item| name(item).to_string()).collect()
}

impl Reconciler {
    #[must_use]
    pub fn new(inventory: Inventory, cache: Arc<dyn CacheIndex>) -> Self {
        Self {
            inventory,
            cache,
            locks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn lock_for(&self, device: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(device.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Converge everything recorded for `device` to `snapshot`.
    pub async fn reconcile(&self, device: &str, snapshot: &Snapshot) -> PassReport {
        let lock = self.lock_for(device);
        let _guard = lock.lock().await;

        let mut report = PassReport::new(device);
        for kind in Kind::ALL {
            let entry = report.kind_mut(kind);
            let result = match kind {
                Kind::VirtualServers => self.virtualservers(device, snapshot, entry).await,
                Kind::Partitions => self.partitions(device, snapshot, entry).await,
                Kind::Pools => self.pools(device, snapshot, entry).await,
                Kind::Poolmembers => self.poolmembers(device, snapshot, entry).await,
                Kind::Orphans => self.orphans(device, snapshot, entry).await,
            };
            if let Err(err) = result {
                warn!(device = %device, kind = %kind, error = %err, "Convergence failed");
                entry.fail(err);
            }
        }

        if report.is_clean() {
            match self.cache.apply(vec![CacheOp::set(keyspace::WARM_KEY, "1")]).await {
                Ok(()) => report.warm = true,
                Err(err) => warn!(error = %err, "Failed to set cache warm marker"),
            }
        }

        info!(
            device = %device,
            churn = report.churn(),
            updated = report.poolmembers.updated + report.virtualservers.updated,
            clean = report.is_clean(),
            "Reconciliation pass finished"
        );
        report
    }

    async fn virtualservers(
        &self,
        device: &str,
        snapshot: &Snapshot,
        report: &mut KindReport,
    ) -> Result<()> {
        let device_key = keyspace::device_virtualservers(device);
        let current = self.cache.members_for_update(&device_key).await?;
        let desired = snapshot.virtualserver_names();

        let mut ops = Vec::new();
        for vs in &snapshot.virtualservers {
            let address_key = keyspace::virtualserver_address(device, &vs.name);
            if current.contains(&vs.name) {
                let previous = self.cache.get(&address_key).await?;
                if previous.as_deref() != Some(vs.address.as_str()) {
                    report.updated += 1;
                }
            } else {
                report.added += 1;
            }
            ops.push(CacheOp::sadd(&device_key, &vs.name));
            ops.push(CacheOp::sadd(keyspace::virtualserver_devices(&vs.name), device));
            ops.push(CacheOp::set(address_key, &vs.address));
        }

        for stale in current.difference(&desired) {
            debug!(device = %device, virtualserver = %stale, "Removing virtual server");
            ops.push(CacheOp::srem(&device_key, stale));
            ops.push(CacheOp::srem(keyspace::virtualserver_devices(stale), device));
            ops.push(CacheOp::del(keyspace::virtualserver_address(device, stale)));
            report.removed += 1;
        }

        self.cache.apply(ops).await
    }

    /// Partitions only materialize through their pool members, so this kind
    /// only ever removes. A removed partition takes its pools' cache sets
    /// with it.
    async fn partitions(
        &self,
        device: &str,
        snapshot: &Snapshot,
        report: &mut KindReport,
    ) -> Result<()> {
        let desired = snapshot.partition_names();
        let mut ops = Vec::new();
        for partition in self.inventory.device(device).partitions()? {
            if desired.contains(partition.name()) {
                continue;
            }
            info!(device = %device, partition = %partition.name(), "Removing partition");
            let pools = partition.pools()?;
            match partition.delete() {
                Ok(_) => {
                    for pool in &pools {
                        ops.push(CacheOp::del(keyspace::pool_members(device, pool.name().as_str())));
                    }
                    report.removed += 1;
                }
                Err(err) => report.fail(format!("partition {}: {err}", partition.name())),
            }
        }
        self.cache.apply(ops).await
    }

    /// Like partitions, pools are created by pool member convergence; stale
    /// pools are removed from the store along with their cache set.
    async fn pools(&self, device: &str, snapshot: &Snapshot, report: &mut KindReport) -> Result<()> {
        let desired = snapshot.pool_names();
        let mut ops = Vec::new();
        for pool in self.inventory.device(device).pools()? {
            if desired.contains(pool.name()) {
                continue;
            }
            info!(device = %device, pool = %pool.name(), "Removing pool");
            match pool.delete() {
                Ok(_) => {
                    ops.push(CacheOp::del(keyspace::pool_members(device, pool.name().as_str())));
                    report.removed += 1;
                }
                Err(err) => report.fail(format!("pool {}: {err}", pool.name())),
            }
        }
        self.cache.apply(ops).await
    }

    async fn poolmembers(
        &self,
        device: &str,
        snapshot: &Snapshot,
        report: &mut KindReport,
    ) -> Result<()> {
        for pool in snapshot.pool_names() {
            let observed = snapshot.members_of(&pool);
            if let Err(err) = self.converge_pool(device, &pool, observed, report).await {
                report.fail(format!("pool {pool}: {err}"));
            }
        }
        Ok(())
    }

    async fn converge_pool(
        &self,
        device: &str,
        pool: &PoolName,
        observed: &[ObservedMember],
        report: &mut KindReport,
    ) -> Result<()> {
        let desired = names(observed, |m| m.name.as_str());

        for member in observed {
            let mut pm = self
                .inventory
                .poolmember(&member.name)
                .with_device(device)
                .with_pool(pool.clone());
            if let Err(err) = self.converge_member(&mut pm, member, report).await {
                report.fail(format!("poolmember {pool}/{}: {err}", member.name));
            }
        }

        let stored = self
            .inventory
            .device(device)
            .with_pool(pool.clone())
            .poolmembers()?;
        for stale in stored.iter().filter(|pm| !desired.contains(pm.name())) {
            debug!(device = %device, pool = %pool, node = %stale.name(), "Removing poolmember");
            match stale.delete() {
                Ok(_) => report.removed += 1,
                Err(err) => report.fail(format!("poolmember {pool}/{}: {err}", stale.name())),
            }
        }

        let key = keyspace::pool_members(device, pool.as_str());
        let cached = self.cache.members_for_update(&key).await?;
        let mut ops: Vec<CacheOp> = desired
            .difference(&cached)
            .map(|node| CacheOp::sadd(&key, node))
            .collect();
        ops.extend(cached.difference(&desired).map(|node| CacheOp::srem(&key, node)));
        self.cache.apply(ops).await
    }

    /// Existing members take the observed enabled flag without echoing it
    /// back to the device; absent ones are created.
    async fn converge_member(
        &self,
        pm: &mut Poolmember,
        observed: &ObservedMember,
        report: &mut KindReport,
    ) -> Result<()> {
        if !pm.exists()? {
            pm.create(observed.port, observed.enabled)?;
            report.added += 1;
            return Ok(());
        }

        if pm.enabled()? != observed.enabled {
            report.updated += 1;
        }
        pm.set_skip_f5(true);
        pm.set_enabled(observed.enabled).await
    }

    /// Observed nodes that are neither recorded nor reported as a member of
    /// any pool on the device.
    async fn orphans(&self, device: &str, snapshot: &Snapshot, report: &mut KindReport) -> Result<()> {
        let mut known = snapshot.member_names();
        known.extend(
            self.inventory
                .device(device)
                .all_poolmembers()?
                .iter()
                .map(|pm| pm.name().to_string()),
        );
        let desired: BTreeSet<String> = snapshot
            .nodes
            .iter()
            .filter(|node| !known.contains(node.as_str()))
            .cloned()
            .collect();

        let key = keyspace::device_orphans(device);
        let current = self.cache.members_for_update(&key).await?;
        report.added = desired.difference(&current).count();

        let mut ops: Vec<CacheOp> = desired.iter().map(|node| CacheOp::sadd(&key, node)).collect();
        for stale in current.difference(&desired) {
            ops.push(CacheOp::srem(&key, stale));
            report.removed += 1;
        }
        self.cache.apply(ops).await
    }
}
