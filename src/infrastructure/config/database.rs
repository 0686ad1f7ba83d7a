//! Relational store configuration.

use serde::Deserialize;

use crate::adapter::outbound::sqlite::database::connection::DEFAULT_POOL_SIZE;

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or `:memory:`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_url() -> String {
    "lbsync.db".to_string()
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            pool_size: default_pool_size(),
        }
    }
}
