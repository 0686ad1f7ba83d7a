//! Device-agnostic domain types: names, snapshots and change requests.

pub mod change;
pub mod name;
pub mod snapshot;

pub use change::MembershipChange;
pub use name::{ensure_path, PartitionName, PoolName, SEPARATOR};
pub use snapshot::{ObservedMember, Snapshot, VirtualServer};
