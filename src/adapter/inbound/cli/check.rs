//! Handler for the `check` command.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::auth::AuthKind;
use crate::infrastructure::config::device::PASSWORD_ENV;
use crate::infrastructure::config::settings::Config;

/// Report the effective configuration. Loading already validated it.
pub fn execute(path: &Path, config: &Config) -> Result<()> {
    if output::is_json() {
        return output::document(&json!({
            "command": "check",
            "config": path.display().to_string(),
            "valid": true,
            "database": config.database.url,
            "cache_hosts": config.cache.hosts().collect::<Vec<_>>(),
            "sentinel": config.cache.sentinel,
            "device_password": config.device.password.is_some(),
        }));
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Database", &config.database.url);
    output::field("Cache", &config.cache.host);
    output::field("Sentinel", config.cache.sentinel);
    output::field("Device user", &config.device.username);

    if config.device.password.is_some() {
        output::success("Device password detected");
    } else {
        output::warning(&format!("Device password not set ({PASSWORD_ENV})"));
    }
    if config.auth.strategy == AuthKind::Disabled {
        output::warning("Authentication is disabled");
    }
    Ok(())
}
