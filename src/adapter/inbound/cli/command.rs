//! Command-line interface definitions.
//!
//! Defines the CLI structure for the lbsync binary using `clap`: schema
//! migration, snapshot reconciliation, membership listing, node state
//! changes and configuration checks.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Load-balancer pool membership synchronization
#[derive(Parser, Debug)]
#[command(name = "lbsync")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "lbsync.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the topology database schema
    Migrate,

    /// Converge store and cache to an observed device snapshot
    Reconcile(ReconcileArgs),

    /// List recorded pool members of a device
    Members(MembersArgs),

    /// Enable nodes on a device
    Enable(ChangeArgs),

    /// Disable nodes on a device
    Disable(ChangeArgs),

    /// Validate the configuration file
    Check,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Device hostname the snapshot was taken from
    #[arg(long)]
    pub device: String,

    /// Snapshot JSON file
    #[arg(long)]
    pub snapshot: PathBuf,
}

#[derive(Args, Debug)]
pub struct MembersArgs {
    /// Device hostname
    #[arg(long)]
    pub device: String,

    /// Restrict to one pool
    #[arg(long)]
    pub pool: Option<String>,

    /// Answer even before the cache has been warmed by a full pass
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ChangeArgs {
    /// Device hostname
    #[arg(long)]
    pub device: String,

    /// Node names
    #[arg(required = true)]
    pub nodes: Vec<String>,

    /// Operator user name
    #[arg(long)]
    pub user: Option<String>,

    /// Operator key
    #[arg(long)]
    pub key: Option<String>,
}
