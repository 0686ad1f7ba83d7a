//! Outcome of a reconciliation pass.

use std::fmt;

use serde::Serialize;

/// Resource kinds converged independently within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    VirtualServers,
    Partitions,
    Pools,
    Poolmembers,
    Orphans,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::VirtualServers,
        Kind::Partitions,
        Kind::Pools,
        Kind::Poolmembers,
        Kind::Orphans,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::VirtualServers => "virtualservers",
            Kind::Partitions => "partitions",
            Kind::Pools => "pools",
            Kind::Poolmembers => "poolmembers",
            Kind::Orphans => "orphans",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one kind's convergence did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub added: usize,
    pub removed: usize,
    /// Entries kept but rewritten: enabled flags or addresses that changed.
    pub updated: usize,
    pub errors: Vec<String>,
}

impl KindReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Net additions plus removals.
    #[must_use]
    pub fn churn(&self) -> usize {
        self.added + self.removed
    }

    pub(super) fn fail(&mut self, error: impl fmt::Display) {
        self.errors.push(error.to_string());
    }
}

/// Per-kind results of one device's pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub device: String,
    pub virtualservers: KindReport,
    pub partitions: KindReport,
    pub pools: KindReport,
    pub poolmembers: KindReport,
    pub orphans: KindReport,
    /// Whether the warm marker was written after this pass.
    pub warm: bool,
}

impl PassReport {
    pub(super) fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kind(&self, kind: Kind) -> &KindReport {
        match kind {
            Kind::VirtualServers => &self.virtualservers,
            Kind::Partitions => &self.partitions,
            Kind::Pools => &self.pools,
            Kind::Poolmembers => &self.poolmembers,
            Kind::Orphans => &self.orphans,
        }
    }

    pub(super) fn kind_mut(&mut self, kind: Kind) -> &mut KindReport {
        match kind {
            Kind::VirtualServers => &mut self.virtualservers,
            Kind::Partitions => &mut self.partitions,
            Kind::Pools => &mut self.pools,
            Kind::Poolmembers => &mut self.poolmembers,
            Kind::Orphans => &mut self.orphans,
        }
    }

    /// True when no kind recorded an error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        Kind::ALL.iter().all(|kind| self.kind(*kind).is_ok())
    }

    /// Additions plus removals across every kind.
    #[must_use]
    pub fn churn(&self) -> usize {
        Kind::ALL.iter().map(|kind| self.kind(*kind).churn()).sum()
    }
}
