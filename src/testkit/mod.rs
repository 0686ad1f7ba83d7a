//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`device`] - `RecordingConnector`, a fake appliance fleet that records writes.
//! - [`store`] - Migrated in-memory stores and ready inventories.
//! - [`snapshot`] - Fluent builder for observed snapshots.

pub mod device;
pub mod snapshot;
pub mod store;
