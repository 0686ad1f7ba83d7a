//! Redis-backed cache index.
//!
//! Standalone mode talks to one server for reads and writes. Sentinel mode
//! resolves the configured master for writes and a replica for reads,
//! falling back to the master when no replica is reachable. Sets read to
//! compute a diff come from the master so replica lag cannot hide entries.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::sentinel::{SentinelClient, SentinelNodeConnectionInfo, SentinelServerType};
use redis::{AsyncCommands, Client, RedisConnectionInfo};
use tracing::{info, warn};

use crate::error::Result;
use crate::infrastructure::config::cache::CacheConfig;
use crate::port::outbound::cache::{CacheIndex, CacheOp};

/// Cache index stored in Redis.
#[derive(Clone)]
pub struct RedisCacheIndex {
    writer: MultiplexedConnection,
    reader: MultiplexedConnection,
}

fn standalone_url(host: &str, port: u16, db: i64) -> String {
    format!("redis://{host}:{port}/{db}")
}

fn sentinel_urls(config: &CacheConfig) -> Vec<String> {
    config
        .hosts()
        .map(|host| format!("redis://{host}:{}", config.port))
        .collect()
}

fn sentinel_client(config: &CacheConfig, server_type: SentinelServerType) -> Result<SentinelClient> {
    let node_info = SentinelNodeConnectionInfo {
        tls_mode: None,
        redis_connection_info: Some(RedisConnectionInfo {
            db: config.db,
            ..Default::default()
        }),
    };
    Ok(SentinelClient::build(
        sentinel_urls(config),
        config.master_name.clone(),
        Some(node_info),
        server_type,
    )?)
}

impl RedisCacheIndex {
    /// Connect according to the cache configuration.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        if config.sentinel {
            let mut master = sentinel_client(config, SentinelServerType::Master)?;
            let writer = master.get_async_connection().await?;

            let mut replica = sentinel_client(config, SentinelServerType::Replica)?;
            let reader = match replica.get_async_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "No reachable replica, reading from master");
                    writer.clone()
                }
            };

            info!(master = %config.master_name, "Connected to cache through sentinel");
            return Ok(Self { writer, reader });
        }

        let client = Client::open(standalone_url(&config.host, config.port, config.db))?;
        let writer = client.get_multiplexed_async_connection().await?;
        info!(host = %config.host, port = config.port, db = config.db, "Connected to cache");
        Ok(Self {
            reader: writer.clone(),
            writer,
        })
    }
}

#[async_trait]
impl CacheIndex for RedisCacheIndex {
    async fn members(&self, key: &str) -> Result<BTreeSet<String>> {
        let mut conn = self.reader.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn members_for_update(&self, key: &str) -> Result<BTreeSet<String>> {
        let mut conn = self.writer.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.reader.clone();
        Ok(conn.get(key).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.reader.clone();
        Ok(conn.exists(key).await?)
    }

    async fn apply(&self, ops: Vec<CacheOp>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                CacheOp::SAdd { key, member } => pipe.sadd(key, member).ignore(),
                CacheOp::SRem { key, member } => pipe.srem(key, member).ignore(),
                CacheOp::Set { key, value } => pipe.set(key, value).ignore(),
                CacheOp::Del { key } => pipe.del(key).ignore(),
            };
        }

        let mut conn = self.writer.clone();
        let (): () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.writer.clone();
        let (): () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }
}
