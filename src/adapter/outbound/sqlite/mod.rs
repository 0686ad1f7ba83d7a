//! SQLite persistence adapter: the relational record of desired membership.

pub mod database;
pub mod store;

pub use store::{Field, MemberFilter, MemberKey, TopologyStore};
