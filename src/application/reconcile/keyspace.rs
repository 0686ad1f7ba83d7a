//! Cache index key layout.

/// Marker set once a full pass has succeeded; read paths wait for it.
pub const WARM_KEY: &str = "lbsync::cache_warm";

/// Set of virtual-server names served by a device.
pub fn device_virtualservers(device: &str) -> String {
    format!("device::virtualservers::{device}")
}

/// Set of devices serving a virtual server.
pub fn virtualserver_devices(name: &str) -> String {
    format!("virtualserver::{name}")
}

/// Address of a virtual server on one device.
pub fn virtualserver_address(device: &str, name: &str) -> String {
    format!("virtualserver::ip::{device}::{name}")
}

/// Nodes seen on a device that belong to no pool.
pub fn device_orphans(device: &str) -> String {
    format!("device::orphans::{device}")
}

/// Node names in one pool on one device.
pub fn pool_members(device: &str, pool: &str) -> String {
    format!("pool::members::{device}::{pool}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(device_virtualservers("lb1"), "device::virtualservers::lb1");
        assert_eq!(virtualserver_devices("vsA"), "virtualserver::vsA");
        assert_eq!(virtualserver_address("lb1", "vsA"), "virtualserver::ip::lb1::vsA");
        assert_eq!(device_orphans("lb1"), "device::orphans::lb1");
        assert_eq!(pool_members("lb1", "/P/web"), "pool::members::lb1::/P/web");
    }
}
