//! Raw key-value online store
//!
//! [`RawKvOnlineStore`] implements the host [`OnlineStore`] contract on top of
//! a [`KvBackend`]. Construction only validates the config; the substrate
//! connection is opened on first use and shared by every later call.

use async_trait::async_trait;
use featurekv_core::{
    read_batch, resolve_requested_features, write_batch, EntityKey, FeatureRecord, FeatureRow,
    Error, FeatureViewSchema, OnlineStore, Progress, Result, ValueCodec,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::backend::KvBackend;
use crate::config::{OnlineStoreConfig, StoreMode};

/// Online store over a raw key-value substrate
pub struct RawKvOnlineStore {
    config: OnlineStoreConfig,
    mode: StoreMode,
    codec: Arc<dyn ValueCodec>,
    backend: OnceCell<KvBackend>,
}

impl RawKvOnlineStore {
    /// Create a store that connects lazily
    ///
    /// Fails with a config error for an unsupported mode or a missing
    /// endpoint. No I/O happens here.
    pub fn new(config: OnlineStoreConfig) -> Result<Self> {
        let mode = config.validate()?;
        Ok(Self {
            codec: config.codec.build(),
            config,
            mode,
            backend: OnceCell::new(),
        })
    }

    /// Create a store around an already connected backend
    ///
    /// The backend must be of the kind the config names.
    pub fn with_backend(config: OnlineStoreConfig, backend: KvBackend) -> Result<Self> {
        let mode = config.store_mode()?;
        if backend.kind() != config.backend {
            return Err(Error::config(format!(
                "config type is '{}' but the supplied backend is '{}'",
                config.backend,
                backend.kind()
            )));
        }
        Ok(Self {
            codec: config.codec.build(),
            config,
            mode,
            backend: OnceCell::new_with(Some(backend)),
        })
    }

    pub fn config(&self) -> &OnlineStoreConfig {
        &self.config
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// True once the substrate connection has been opened
    pub fn is_connected(&self) -> bool {
        self.backend.initialized()
    }

    /// The shared connection, opened on first call
    ///
    /// Concurrent first callers wait on a single connection attempt. A failed
    /// attempt leaves the cell empty so the next call retries.
    async fn backend(&self) -> Result<&KvBackend> {
        self.backend
            .get_or_try_init(|| async move {
                tracing::info!(
                    backend = %self.config.backend,
                    endpoints = self.config.endpoints().len(),
                    "Opening online store connection"
                );
                KvBackend::connect(&self.config).await
            })
            .await
    }
}

#[async_trait]
impl OnlineStore for RawKvOnlineStore {
    async fn update(
        &self,
        project: &str,
        tables_to_delete: &[&dyn FeatureViewSchema],
        tables_to_keep: &[&dyn FeatureViewSchema],
        partial: bool,
    ) -> Result<()> {
        tracing::debug!(
            project = project,
            tables_to_delete = tables_to_delete.len(),
            tables_to_keep = tables_to_keep.len(),
            partial = partial,
            "Online store update: nothing to provision"
        );
        Ok(())
    }

    async fn teardown(&self, project: &str, tables: &[&dyn FeatureViewSchema]) -> Result<()> {
        tracing::debug!(
            project = project,
            tables = tables.len(),
            "Online store teardown: stored keys are left in place"
        );
        Ok(())
    }

    async fn online_write_batch(
        &self,
        project: &str,
        table: &dyn FeatureViewSchema,
        data: &[FeatureRecord],
        progress: Option<Progress<'_>>,
    ) -> Result<()> {
        let kv = self.backend().await?;
        write_batch(kv, self.codec.as_ref(), project, table.name(), data, progress).await?;
        Ok(())
    }

    async fn online_read(
        &self,
        project: &str,
        table: &dyn FeatureViewSchema,
        entity_keys: &[EntityKey],
        requested_features: Option<&[String]>,
    ) -> Result<Vec<Option<FeatureRow>>> {
        let requested = resolve_requested_features(table, requested_features);
        let kv = self.backend().await?;
        read_batch(
            kv,
            self.codec.as_ref(),
            project,
            table.name(),
            entity_keys,
            &requested,
        )
        .await
    }

    async fn health_check(&self) -> Result<()> {
        let backend = self.backend().await?;
        backend.ping().await?;
        tracing::debug!(backend = %backend.kind(), "Online store healthy");
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        self.config.backend.as_str()
    }
}
