//! Outbound adapters (driven side).

pub mod icontrol;
pub mod memory;
pub mod redis;
pub mod sqlite;
