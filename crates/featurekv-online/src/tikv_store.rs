//! TiKV substrate (raw mode)
//!
//! Uses the raw, non-transactional client: each `put` is an independent write
//! routed by key to its region leader.

use async_trait::async_trait;
use featurekv_core::{Error, RawKv, Result};
use tikv_client::RawClient;

/// Key probed by the health check; it never has to exist
const HEALTH_PROBE_KEY: &[u8] = b"featurekv:health";

/// TiKV-backed [`RawKv`]
pub struct TikvKv {
    client: RawClient,
}

impl TikvKv {
    /// Connect through the placement driver endpoints
    pub async fn connect(pd_endpoints: Vec<String>) -> Result<Self> {
        let endpoints = pd_endpoints.join(",");
        let client = RawClient::new(pd_endpoints)
            .await
            .map_err(|e| Error::SubstrateError(anyhow::anyhow!("TiKV connection error: {}", e)))?;

        tracing::info!(pd_endpoints = %endpoints, "Connected to TiKV");
        Ok(Self { client })
    }

    /// Round-trips a point get to the cluster
    pub async fn ping(&self) -> Result<()> {
        self.get(HEALTH_PROBE_KEY).await.map(|_| ())
    }
}

#[async_trait]
impl RawKv for TikvKv {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.client
            .get(key.to_vec())
            .await
            .map_err(|e| Error::SubstrateError(anyhow::anyhow!("TiKV get error: {}", e)))
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.client
            .put(key, value)
            .await
            .map_err(|e| Error::SubstrateError(anyhow::anyhow!("TiKV put error: {}", e)))
    }
}
