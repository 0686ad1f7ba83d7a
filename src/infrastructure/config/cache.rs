//! Cache index backend configuration.

use std::time::Duration;

use serde::Deserialize;

/// Which cache index implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis, standalone or behind sentinels.
    #[default]
    Redis,
    /// In-process maps; nothing survives the process.
    Memory,
}

/// Redis connection and result-cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Server host, or whitespace separated sentinel hosts.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    /// Lifetime of memoized call results.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Resolve the server through sentinels.
    #[serde(default)]
    pub sentinel: bool,
    /// Sentinel service name of the master.
    #[serde(default = "default_master_name")]
    pub master_name: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_master_name() -> String {
    "beam".to_string()
}

impl CacheConfig {
    /// Configured hosts; more than one only makes sense with sentinels.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.host.split_whitespace()
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            host: default_host(),
            port: default_port(),
            db: 0,
            ttl_secs: default_ttl_secs(),
            sentinel: false,
            master_name: default_master_name(),
        }
    }
}
