//! Pool of live device handles keyed by hostname.
//!
//! A cached handle is only reused after its liveness probe passes; otherwise
//! it is evicted and a fresh connection is opened. Every device call is
//! bounded by the configured call timeout, and calls that fail because the
//! device is unreachable evict the handle they used.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::port::outbound::device::{DeviceConnector, DeviceHandle};

pub struct DevicePool {
    connector: Arc<dyn DeviceConnector>,
    handles: DashMap<String, Arc<dyn DeviceHandle>>,
    call_timeout: Duration,
}

impl DevicePool {
    #[must_use]
    pub fn new(connector: Arc<dyn DeviceConnector>, call_timeout: Duration) -> Self {
        Self {
            connector,
            handles: DashMap::new(),
            call_timeout,
        }
    }

    /// Number of cached handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub fn contains(&self, hostname: &str) -> bool {
        self.handles.contains_key(hostname)
    }

    /// Drop the cached handle for `hostname`. Returns whether one was cached.
    pub fn evict(&self, hostname: &str) -> bool {
        let evicted = self.handles.remove(hostname).is_some();
        if evicted {
            debug!(device = %hostname, "Device handle evicted");
        }
        evicted
    }

    /// A live handle for `hostname`, reusing the cached one when it still
    /// answers its liveness probe.
    pub async fn handle(&self, hostname: &str) -> Result<Arc<dyn DeviceHandle>> {
        let cached = self
            .handles
            .get(hostname)
            .map(|entry| Arc::clone(entry.value()));

        if let Some(handle) = cached {
            let probe = async { Ok(handle.is_alive().await) };
            if self.bounded(hostname, "liveness probe", probe).await.unwrap_or(false) {
                return Ok(handle);
            }
            warn!(device = %hostname, "Cached device handle failed liveness probe");
            self.evict(hostname);
        }

        let handle = self
            .bounded(hostname, "connect", self.connector.connect(hostname))
            .await?;
        self.handles
            .insert(hostname.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Enabled flag of a device-level node.
    pub async fn node_enabled(&self, hostname: &str, node: &str) -> Result<bool> {
        let handle = self.handle(hostname).await?;
        let result = self
            .bounded(hostname, "node read", handle.node_enabled(node))
            .await;
        self.observe(hostname, result)
    }

    /// Set the enabled flag of a device-level node.
    pub async fn set_node_enabled(&self, hostname: &str, node: &str, enabled: bool) -> Result<()> {
        let handle = self.handle(hostname).await?;
        let result = self
            .bounded(hostname, "node write", handle.set_node_enabled(node, enabled))
            .await;
        self.observe(hostname, result)
    }

    /// Set the enabled flag of one pool member on the device.
    pub async fn set_poolmember_enabled(
        &self,
        hostname: &str,
        node: &str,
        port: u16,
        pool: &str,
        enabled: bool,
    ) -> Result<()> {
        let handle = self.handle(hostname).await?;
        let call = handle.set_poolmember_enabled(node, port, pool, enabled);
        let result = self.bounded(hostname, "poolmember write", call).await;
        self.observe(hostname, result)
    }

    async fn bounded<T, F>(&self, hostname: &str, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Connection(format!(
                "{what} on {hostname} timed out after {}ms",
                self.call_timeout.as_millis()
            ))),
        }
    }

    fn observe<T>(&self, hostname: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_device_unreachable() {
                warn!(device = %hostname, error = %err, "Device unreachable");
                self.evict(hostname);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::device::{DeviceCall, RecordingConnector};

    fn pool(connector: &RecordingConnector) -> DevicePool {
        DevicePool::new(Arc::new(connector.clone()), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn live_handles_are_reused() {
        let connector = RecordingConnector::new();
        let pool = pool(&connector);

        pool.handle("lb1").await.unwrap();
        pool.handle("lb1").await.unwrap();

        assert_eq!(connector.connects(), 1);
        assert!(pool.contains("lb1"));
    }

    #[tokio::test]
    async fn dead_handles_are_replaced() {
        let connector = RecordingConnector::new();
        let pool = pool(&connector);

        pool.handle("lb1").await.unwrap();
        connector.set_alive(false);
        pool.handle("lb1").await.unwrap();

        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn unknown_hosts_surface_host_not_found() {
        let connector = RecordingConnector::new();
        connector.mark_unknown("ghost");
        let pool = pool(&connector);

        let result = pool.handle("ghost").await;
        assert!(matches!(result, Err(Error::HostNotFound(_))));
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn slow_calls_time_out_and_evict() {
        let connector = RecordingConnector::new();
        let pool = pool(&connector);
        pool.handle("lb1").await.unwrap();

        connector.set_delay(Duration::from_secs(5));
        let result = pool.set_node_enabled("lb1", "/P/n1", true).await;

        assert!(matches!(result, Err(Error::Connection(_))));
        assert!(!pool.contains("lb1"));
    }

    #[tokio::test]
    async fn writes_reach_the_device() {
        let connector = RecordingConnector::new();
        let pool = pool(&connector);

        pool.set_poolmember_enabled("lb1", "/P/n1", 80, "/P/web", false)
            .await
            .unwrap();

        assert_eq!(
            connector.calls(),
            vec![DeviceCall::Poolmember {
                device: "lb1".into(),
                node: "/P/n1".into(),
                port: 80,
                pool: "/P/web".into(),
                enabled: false,
            }]
        );
    }

    #[tokio::test]
    async fn explicit_eviction() {
        let connector = RecordingConnector::new();
        let pool = pool(&connector);
        pool.handle("lb1").await.unwrap();

        assert!(pool.evict("lb1"));
        assert!(!pool.evict("lb1"));
        assert_eq!(pool.len(), 0);
    }
}
