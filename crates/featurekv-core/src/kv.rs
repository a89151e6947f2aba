//! Raw key-value substrate
//!
//! The online store needs exactly two operations from its backend: a point
//! `get` and a point `put`. No scans, no transactions, no multi-key batches.
//! Backends (TiKV raw mode, Redis, in-memory) implement [`RawKv`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Result;

/// Point get/put over opaque byte keys and values
///
/// Failures must be reported as [`crate::Error::SubstrateError`].
#[async_trait]
pub trait RawKv: Send + Sync {
    /// Returns `None` if the key was never written
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Writes (or overwrites) a single key
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()>;
}

#[async_trait]
impl<T: RawKv + ?Sized> RawKv for Arc<T> {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value).await
    }
}

/// In-process substrate
///
/// Cloning shares the underlying map, so a test can keep a handle and inspect
/// or tamper with what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every stored entry, in key order
    pub async fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl RawKv for MemoryKv {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }
}
