//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Entities + Reconciler  ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Device  │            │ Relational  │              │   Cache   │
//! │Connector│            │   Store     │              │   Index   │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! The relational store is used directly through its SQLite adapter; the
//! cache index and device connector are swappable behind these traits.

pub mod outbound;

pub use outbound::cache::{CacheIndex, CacheOp};
pub use outbound::device::{DeviceConnector, DeviceHandle};
