//! Outbound ports: interfaces the core calls out through.

pub mod cache;
pub mod device;
