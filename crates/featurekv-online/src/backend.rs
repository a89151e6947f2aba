//! Substrate selection
//!
//! [`KvBackend`] is the closed set of substrates the online store can run on,
//! picked once from the config `type`. Backends behind a disabled cargo
//! feature are rejected with a config error instead of failing to link.

use async_trait::async_trait;
use featurekv_core::{Error, MemoryKv, RawKv, Result};

use crate::config::{BackendKind, OnlineStoreConfig};

#[cfg(feature = "redis")]
use crate::redis_store::RedisKv;
#[cfg(feature = "tikv")]
use crate::tikv_store::TikvKv;

/// A connected substrate
pub enum KvBackend {
    Memory(MemoryKv),
    #[cfg(feature = "redis")]
    Redis(RedisKv),
    #[cfg(feature = "tikv")]
    Tikv(TikvKv),
}

impl KvBackend {
    /// Opens the substrate named by `config`
    pub async fn connect(config: &OnlineStoreConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => Ok(KvBackend::Memory(MemoryKv::new())),
            BackendKind::Redis => connect_redis(config).await,
            BackendKind::Tikv => connect_tikv(config).await,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            KvBackend::Memory(_) => BackendKind::Memory,
            #[cfg(feature = "redis")]
            KvBackend::Redis(_) => BackendKind::Redis,
            #[cfg(feature = "tikv")]
            KvBackend::Tikv(_) => BackendKind::Tikv,
        }
    }

    /// Cheapest round trip the substrate offers
    pub async fn ping(&self) -> Result<()> {
        match self {
            KvBackend::Memory(_) => Ok(()),
            #[cfg(feature = "redis")]
            KvBackend::Redis(kv) => kv.ping().await,
            #[cfg(feature = "tikv")]
            KvBackend::Tikv(kv) => kv.ping().await,
        }
    }
}

#[cfg(any(feature = "redis", feature = "tikv"))]
fn first_endpoint(config: &OnlineStoreConfig) -> Result<String> {
    config.endpoints().into_iter().next().ok_or_else(|| {
        Error::config(format!(
            "online store type '{}' requires pd_addresses",
            config.backend
        ))
    })
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &OnlineStoreConfig) -> Result<KvBackend> {
    let url = first_endpoint(config)?;
    Ok(KvBackend::Redis(RedisKv::connect(&url).await?))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_config: &OnlineStoreConfig) -> Result<KvBackend> {
    Err(Error::config(
        "online store type 'redis' requires featurekv-online built with the `redis` feature",
    ))
}

#[cfg(feature = "tikv")]
async fn connect_tikv(config: &OnlineStoreConfig) -> Result<KvBackend> {
    first_endpoint(config)?;
    Ok(KvBackend::Tikv(TikvKv::connect(config.endpoints()).await?))
}

#[cfg(not(feature = "tikv"))]
async fn connect_tikv(_config: &OnlineStoreConfig) -> Result<KvBackend> {
    Err(Error::config(
        "online store type 'tikv' requires featurekv-online built with the `tikv` feature",
    ))
}

#[async_trait]
impl RawKv for KvBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            KvBackend::Memory(kv) => kv.get(key).await,
            #[cfg(feature = "redis")]
            KvBackend::Redis(kv) => kv.get(key).await,
            #[cfg(feature = "tikv")]
            KvBackend::Tikv(kv) => kv.get(key).await,
        }
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        match self {
            KvBackend::Memory(kv) => kv.put(key, value).await,
            #[cfg(feature = "redis")]
            KvBackend::Redis(kv) => kv.put(key, value).await,
            #[cfg(feature = "tikv")]
            KvBackend::Tikv(kv) => kv.put(key, value).await,
        }
    }
}
