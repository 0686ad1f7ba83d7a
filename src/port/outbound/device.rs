//! Device connector port.
//!
//! Addresses a live load-balancer appliance. Implementations decide the
//! transport; the core only needs enabled-state reads and writes plus a
//! liveness probe.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Opens handles to devices by hostname.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Connect to a device.
    ///
    /// Fails with `HostNotFound` when the name does not resolve and with
    /// `Connection` for any other failure.
    async fn connect(&self, hostname: &str) -> Result<Arc<dyn DeviceHandle>>;
}

/// An open session with one device.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Hostname this handle talks to.
    fn hostname(&self) -> &str;

    /// Cheap probe deciding whether the handle can be reused.
    async fn is_alive(&self) -> bool;

    /// Enabled flag of the device-level node object.
    async fn node_enabled(&self, node: &str) -> Result<bool>;

    /// Set the enabled flag of the device-level node object.
    async fn set_node_enabled(&self, node: &str, enabled: bool) -> Result<()>;

    /// Set the enabled flag of one pool member (`node:port` inside `pool`).
    async fn set_poolmember_enabled(
        &self,
        node: &str,
        port: u16,
        pool: &str,
        enabled: bool,
    ) -> Result<()>;
}
