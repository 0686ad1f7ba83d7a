//! Device management API settings.

use std::time::Duration;

use serde::Deserialize;

/// Environment variable holding the device API password.
pub const PASSWORD_ENV: &str = "LBSYNC_DEVICE_PASSWORD";

/// How to reach the load-balancer management API.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_username")]
    pub username: String,
    /// Loaded from [`PASSWORD_ENV`], never from the config file.
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for any single device call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Appliances usually ship self-signed certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl DeviceConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            scheme: default_scheme(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}
