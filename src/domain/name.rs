//! Path-style names for partitions and pools.
//!
//! Every partition and pool name is an absolute path (`/Common/pool_web`).
//! A pool's partition is never stored independently: it is always the first
//! path segment of the pool name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator that starts every partition, pool and node path.
pub const SEPARATOR: char = '/';

/// Reject names that are not absolute paths.
pub fn ensure_path(name: &str) -> Result<()> {
    if name.starts_with(SEPARATOR) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Partition name, e.g. `/Common`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionName(String);

impl PartitionName {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure_path(&name)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pool name, e.g. `/Common/pool_web`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolName(String);

impl PoolName {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure_path(&name)?;
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Partition owning this pool: `/P` for any `/P/rest...`.
    #[must_use]
    pub fn partition(&self) -> PartitionName {
        let first = self.0[1..].split(SEPARATOR).next().unwrap_or_default();
        PartitionName(format!("{SEPARATOR}{first}"))
    }
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = Error;

            fn try_from(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl From<$ty> for String {
            fn from(name: $ty) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_conversions!(PartitionName);
string_conversions!(PoolName);
