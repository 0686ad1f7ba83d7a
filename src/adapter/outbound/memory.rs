//! In-process cache index.
//!
//! Mirrors the Redis semantics the core relies on (sets vanish when their
//! last member is removed, string keys may expire) behind a single lock, so a
//! batch is applied atomically. Backs the `memory` cache backend and tests.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::port::outbound::cache::{CacheIndex, CacheOp};

#[derive(Debug, Clone)]
enum Entry {
    Set(BTreeSet<String>),
    Str {
        value: String,
        expires_at: Option<Instant>,
    },
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        match self {
            Entry::Set(members) => !members.is_empty(),
            Entry::Str { expires_at, .. } => expires_at.map_or(true, |at| at > now),
        }
    }
}

/// Cache index held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCacheIndex {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCacheIndex {
    /// Create a new empty cache index.
    pub fn new() -> Self {
        Self::default()
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn wrong_type(key: &str) -> Error {
        Error::Cache(format!(
            "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
        ))
    }

    fn apply_one(entries: &mut HashMap<String, Entry>, op: CacheOp) -> Result<()> {
        match op {
            CacheOp::SAdd { key, member } => {
                let entry = entries
                    .entry(key.clone())
                    .or_insert_with(|| Entry::Set(BTreeSet::new()));
                match entry {
                    Entry::Set(members) => {
                        members.insert(member);
                    }
                    Entry::Str { .. } => return Err(Self::wrong_type(&key)),
                }
            }
            CacheOp::SRem { key, member } => {
                let now_empty = match entries.get_mut(&key) {
                    Some(Entry::Set(members)) => {
                        members.remove(&member);
                        members.is_empty()
                    }
                    Some(Entry::Str { .. }) => return Err(Self::wrong_type(&key)),
                    None => false,
                };
                if now_empty {
                    entries.remove(&key);
                }
            }
            CacheOp::Set { key, value } => {
                entries.insert(
                    key,
                    Entry::Str {
                        value,
                        expires_at: None,
                    },
                );
            }
            CacheOp::Del { key } => {
                entries.remove(&key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CacheIndex for MemoryCacheIndex {
    async fn members(&self, key: &str) -> Result<BTreeSet<String>> {
        match self.entries.read().get(key) {
            Some(Entry::Set(members)) => Ok(members.clone()),
            Some(Entry::Str { .. }) => Err(Self::wrong_type(key)),
            None => Ok(BTreeSet::new()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        match self.entries.read().get(key) {
            Some(Entry::Set(_)) => Err(Self::wrong_type(key)),
            Some(Entry::Str { value, expires_at }) if expires_at.map_or(true, |at| at > now) => {
                Ok(Some(value.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn apply(&self, ops: Vec<CacheOp>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        // Validate against a scratch copy so a failing op leaves nothing applied.
        let mut entries = self.entries.write();
        let mut scratch = entries.clone();
        for op in ops {
            Self::apply_one(&mut scratch, op)?;
        }
        *entries = scratch;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.write().insert(
            key.to_string(),
            Entry::Str {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }
}
