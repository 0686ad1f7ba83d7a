//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the device password only ever
//! comes from the `LBSYNC_DEVICE_PASSWORD` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use lbsync::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("lbsync.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::auth::{AuthConfig, AuthKind};
use super::cache::CacheConfig;
use super::database::DatabaseConfig;
use super::device::{DeviceConfig, PASSWORD_ENV};
use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Relational store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cache index backend and result-cache TTL.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Device management API settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Authentication strategy for operator requests.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.device.password = std::env::var(PASSWORD_ENV).ok();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.cache.hosts().next().is_none() {
            return Err(ConfigError::MissingField { field: "host" }.into());
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !self.cache.sentinel && self.cache.hosts().count() > 1 {
            return Err(ConfigError::InvalidValue {
                field: "host",
                reason: "multiple hosts require sentinel = true".to_string(),
            }
            .into());
        }
        if self.device.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !matches!(self.device.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "scheme",
                reason: format!("expected http or https, got {}", self.device.scheme),
            }
            .into());
        }
        if self.auth.strategy == AuthKind::StaticKeys && self.auth.keys_file.is_none() {
            return Err(ConfigError::MissingField { field: "keys_file" }.into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infrastructure::config::cache::CacheBackend;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.url, "lbsync.db");
        assert_eq!(config.cache.port, 6379);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.master_name, "beam");
        assert_eq!(config.device.port, 443);
        assert_eq!(config.auth.strategy, AuthKind::Disabled);
    }

    #[test]
    fn full_config_parses() {
        let toml = r#"
[logging]
level = "debug"
format = "json"

[database]
url = "/var/lib/lbsync/topology.db"
pool_size = 2

[cache]
host = "s1 s2"
port = 26379
db = 3
ttl_secs = 60
sentinel = true
master_name = "beam"

[device]
username = "ops"
timeout_ms = 2500

[auth]
strategy = "static_keys"
keys_file = "/etc/lbsync/auth.toml"
"#;
        let config = Config::parse_toml(toml).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.cache.hosts().collect::<Vec<_>>(), vec!["s1", "s2"]);
        assert_eq!(config.cache.db, 3);
        assert_eq!(config.device.timeout().as_millis(), 2500);
        assert_eq!(config.auth.strategy, AuthKind::StaticKeys);
    }

    #[test]
    fn multiple_hosts_need_sentinel() {
        let result = Config::parse_toml("[cache]\nhost = \"a b\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "host", .. }))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = Config::parse_toml("[device]\ntimeout_ms = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "timeout_ms",
                ..
            }))
        ));
    }

    #[test]
    fn static_keys_need_a_file() {
        let result = Config::parse_toml("[auth]\nstrategy = \"static_keys\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "keys_file" }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[cache\n");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
