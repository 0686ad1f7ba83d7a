//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod device_pool;
pub mod memo;
pub mod readiness;
pub mod reconcile;
pub mod topology;
