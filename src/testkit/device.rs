//! In-process device connector that records every write.
//!
//! Node state defaults to enabled. Writes update the recorded node state so
//! later reads observe them, mirroring a real appliance.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::outbound::device::{DeviceConnector, DeviceHandle};

/// One write observed by the fake device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Node {
        device: String,
        node: String,
        enabled: bool,
    },
    Poolmember {
        device: String,
        node: String,
        port: u16,
        pool: String,
        enabled: bool,
    },
}

#[derive(Default)]
struct State {
    calls: Mutex<Vec<DeviceCall>>,
    nodes: Mutex<HashMap<(String, String), bool>>,
    unknown: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    dead: AtomicBool,
    failing: AtomicBool,
    connects: AtomicUsize,
}

/// Shared handle to a fleet of fake devices.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    state: Arc<State>,
}

impl RecordingConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.lock().clear();
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Seed the live state of a node.
    pub fn set_node(&self, device: &str, node: &str, enabled: bool) {
        self.state
            .nodes
            .lock()
            .insert((device.to_string(), node.to_string()), enabled);
    }

    /// Hostnames that fail to resolve.
    pub fn mark_unknown(&self, hostname: &str) {
        self.state.unknown.lock().insert(hostname.to_string());
    }

    /// Hostnames that resolve but refuse connections.
    pub fn mark_unreachable(&self, hostname: &str) {
        self.state.unreachable.lock().insert(hostname.to_string());
    }

    /// Liveness probe answer for existing handles.
    pub fn set_alive(&self, alive: bool) {
        self.state.dead.store(!alive, Ordering::SeqCst);
    }

    /// Make every read and write fail with a connection error.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay applied to reads and writes (not to connects or probes).
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }
}

#[async_trait]
impl DeviceConnector for RecordingConnector {
    async fn connect(&self, hostname: &str) -> Result<Arc<dyn DeviceHandle>> {
        if self.state.unknown.lock().contains(hostname) {
            return Err(Error::HostNotFound(hostname.to_string()));
        }
        if self.state.unreachable.lock().contains(hostname) {
            return Err(Error::Connection(format!("could not connect to {hostname}")));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.state.dead.store(false, Ordering::SeqCst);
        Ok(Arc::new(RecordingHandle {
            hostname: hostname.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingHandle {
    hostname: String,
    state: Arc<State>,
}

impl RecordingHandle {
    async fn before_call(&self) -> Result<()> {
        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(Error::Connection(format!("{} stopped answering", self.hostname)));
        }
        Ok(())
    }

    fn set_node_state(&self, node: &str, enabled: bool) {
        self.state
            .nodes
            .lock()
            .insert((self.hostname.clone(), node.to_string()), enabled);
    }
}

#[async_trait]
impl DeviceHandle for RecordingHandle {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn is_alive(&self) -> bool {
        !self.state.dead.load(Ordering::SeqCst)
    }

    async fn node_enabled(&self, node: &str) -> Result<bool> {
        self.before_call().await?;
        Ok(self
            .state
            .nodes
            .lock()
            .get(&(self.hostname.clone(), node.to_string()))
            .copied()
            .unwrap_or(true))
    }

    async fn set_node_enabled(&self, node: &str, enabled: bool) -> Result<()> {
        self.before_call().await?;
        self.set_node_state(node, enabled);
        self.state.calls.lock().push(DeviceCall::Node {
            device: self.hostname.clone(),
            node: node.to_string(),
            enabled,
        });
        Ok(())
    }

    async fn set_poolmember_enabled(
        &self,
        node: &str,
        port: u16,
        pool: &str,
        enabled: bool,
    ) -> Result<()> {
        self.before_call().await?;
        self.state.calls.lock().push(DeviceCall::Poolmember {
            device: self.hostname.clone(),
            node: node.to_string(),
            port,
            pool: pool.to_string(),
            enabled,
        });
        Ok(())
    }
}
