//! Cache index port.
//!
//! The cache index is a derived, read-optimized view of the topology. Writes
//! are expressed as [`CacheOp`] batches so a backend can ship one batch as a
//! single atomic pipeline.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A single cache mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    /// Add a member to a set.
    SAdd { key: String, member: String },
    /// Remove a member from a set.
    SRem { key: String, member: String },
    /// Set a plain string value.
    Set { key: String, value: String },
    /// Delete a key of any type.
    Del { key: String },
}

impl CacheOp {
    pub fn sadd(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SAdd {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn srem(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SRem {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Self::Del { key: key.into() }
    }

    /// Key touched by this operation.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::SAdd { key, .. } | Self::SRem { key, .. } | Self::Set { key, .. } => key,
            Self::Del { key } => key,
        }
    }
}

/// Read and batch-write access to the cache index.
#[async_trait]
pub trait CacheIndex: Send + Sync {
    /// Members of a set; empty when the key does not exist.
    async fn members(&self, key: &str) -> Result<BTreeSet<String>>;

    /// Members of a set as seen by the node that takes writes. Use this when
    /// the result feeds a diff that is written back.
    async fn members_for_update(&self, key: &str) -> Result<BTreeSet<String>> {
        self.members(key).await
    }

    /// Value of a string key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Apply a batch of operations as one atomic unit. Empty batches are no-ops.
    async fn apply(&self, ops: Vec<CacheOp>) -> Result<()>;

    /// Set a string key that expires after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}
