//! Handler for the `migrate` command.

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

pub fn execute(config: &Config) -> Result<()> {
    bootstrap::open_store(config)?;

    if output::is_json() {
        return output::document(&json!({
            "command": "migrate",
            "database": config.database.url,
            "status": "ok",
        }));
    }

    output::success(&format!("Schema is up to date in {}", config.database.url));
    Ok(())
}
