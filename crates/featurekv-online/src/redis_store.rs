//! Redis substrate
//!
//! Plain `GET`/`SET` on binary-safe keys through a multiplexed
//! [`ConnectionManager`] (one TCP connection, concurrent requests, automatic
//! reconnect). No pipelines: every put is an independent point write.

use async_trait::async_trait;
use featurekv_core::{Error, RawKv, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Redis-backed [`RawKv`]
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
}

impl RedisKv {
    /// Connect to Redis (e.g. `redis://localhost:6379`)
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| Error::SubstrateError(anyhow::anyhow!("Redis connection error: {}", e)))?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            Error::SubstrateError(anyhow::anyhow!("Redis connection manager error: {}", e))
        })?;

        tracing::info!(url = url, "Connected to Redis");
        Ok(Self { conn })
    }

    /// Health check using PING
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::SubstrateError(anyhow::anyhow!("Redis PING failed: {}", e)))?;

        if pong != "PONG" {
            return Err(Error::SubstrateError(anyhow::anyhow!(
                "Redis health check failed: expected PONG, got {}",
                pong
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RawKv for RedisKv {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<Vec<u8>>>(key).await.map_err(Error::substrate)
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await.map_err(Error::substrate)
    }
}
