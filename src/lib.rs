//! lbsync - load-balancer pool membership synchronization.
//!
//! Keeps one topology (devices, partitions, pools, pool members, nodes)
//! consistent across a live appliance, a relational record of desired
//! membership and a read-optimized cache index.
//!
//! # Architecture
//!
//! - **`domain`** - Path names with partition derivation, observed
//!   snapshots and membership change requests
//! - **`port`** - Traits at the seams: cache index and device connector
//! - **`adapter`** - SQLite store (diesel), Redis and in-process cache
//!   indexes, the REST device connector, and the CLI
//! - **`application`** - Entity model, reconciler, device handle pool,
//!   result cache and readiness gate
//! - **`infrastructure`** - Configuration, authentication and wiring
//!
//! # Example
//!
//! ```no_run
//! use lbsync::domain::Snapshot;
//! use lbsync::infrastructure::bootstrap::App;
//! use lbsync::infrastructure::config::Config;
//!
//! # async fn run() -> lbsync::error::Result<()> {
//! let app = App::build(Config::load("lbsync.toml")?).await?;
//! let snapshot = Snapshot::from_json(&std::fs::read_to_string("lb1.json")?)?;
//! let report = app.reconciler.reconcile("lb1", &snapshot).await;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
