//! Online store trait for low-latency feature serving
//!
//! The host feature store materializes the latest feature values of each
//! feature view into an online store and reads them back at inference time.
//! Implementations map that contract onto a raw key-value substrate using the
//! [`crate::writer`] and [`crate::reader`] protocols.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐  online_write_batch  ┌────────────────────┐
//! │  Host feature store │ ───────────────────► │   Online Store     │
//! │  - Feature views    │                      │  - N+2 puts/record │
//! │  - Materialization  │ ◄─────────────────── │  - Point gets      │
//! │  - Serving API      │      online_read     │  - Latest values   │
//! └─────────────────────┘                      └─────────┬──────────┘
//!                                                        │ get / put
//!                                              ┌─────────▼──────────┐
//!                                              │  Raw KV substrate  │
//!                                              │ (TiKV/Redis/memory)│
//!                                              └────────────────────┘
//! ```
//!
//! ## Key Design Decisions
//!
//! 1. **Flat key-value model**: one key per (entity, feature view, field)
//! 2. **Only latest values**: no point-in-time queries
//! 3. **No provisioning**: keys are created on first write, `update` and
//!    `teardown` have nothing to do
//! 4. **No transactions**: a failed batch may leave earlier puts in place
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use featurekv_core::{EntityKey, FeatureView, OnlineStore};
//!
//! async fn serve_features(store: &dyn OnlineStore, view: &FeatureView) {
//!     let entities = vec![EntityKey::new("driver_id", 1001_i64)];
//!     let rows = store.online_read("demo", view, &entities, None).await?;
//! }
//! ```

use async_trait::async_trait;

use crate::schema::FeatureViewSchema;
use crate::writer::Progress;
use crate::{EntityKey, FeatureRecord, FeatureRow, Result};

/// Contract between the host feature store and an online store
///
/// ## Implementation Requirements
///
/// - `online_write_batch`: N+2 independent puts per record, `progress(1)`
///   once per record
/// - `online_read`: one entry per entity key, in input order; `None` when none
///   of the requested features exist
/// - Thread-safe (Send + Sync)
///
/// ## Key Format
///
/// `<project>:<serialized entity key>:<feature view>:<field>`, see
/// [`crate::key`].
#[async_trait]
pub trait OnlineStore: Send + Sync {
    /// Provisioning hook, called when feature views are applied or removed
    ///
    /// Keys are created lazily by writes, so implementations on a raw
    /// key-value substrate do nothing here.
    async fn update(
        &self,
        project: &str,
        tables_to_delete: &[&dyn FeatureViewSchema],
        tables_to_keep: &[&dyn FeatureViewSchema],
        partial: bool,
    ) -> Result<()>;

    /// Teardown hook, called when the project is destroyed
    ///
    /// Stored keys are left in place; there is no scan to find them.
    async fn teardown(&self, project: &str, tables: &[&dyn FeatureViewSchema]) -> Result<()>;

    /// Write the latest feature values for a batch of entities
    ///
    /// # Arguments
    ///
    /// * `project` - Project namespace
    /// * `table` - Feature view being materialized
    /// * `data` - Records to write, in order
    /// * `progress` - Called with `1` once per record written
    ///
    /// # Semantics
    ///
    /// - Upsert: last write wins per key
    /// - Not atomic: a substrate failure aborts the batch and keeps what
    ///   already landed
    async fn online_write_batch(
        &self,
        project: &str,
        table: &dyn FeatureViewSchema,
        data: &[FeatureRecord],
        progress: Option<Progress<'_>>,
    ) -> Result<()>;

    /// Read features for the specified entities
    ///
    /// `requested_features` of `None` (or an empty list) means every feature
    /// the view declares.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let entities = vec![
    ///     EntityKey::new("driver_id", 1001_i64),
    ///     EntityKey::new("driver_id", 1002_i64),
    /// ];
    /// let rows = store.online_read("demo", &view, &entities, None).await?;
    /// assert_eq!(rows.len(), 2);
    /// ```
    async fn online_read(
        &self,
        project: &str,
        table: &dyn FeatureViewSchema,
        entity_keys: &[EntityKey],
        requested_features: Option<&[String]>,
    ) -> Result<Vec<Option<FeatureRow>>>;

    /// Check if the online store is healthy and ready
    async fn health_check(&self) -> Result<()>;

    /// Get the name of this online store type (for logging)
    fn store_type(&self) -> &'static str;
}

/// Resolves the feature projection of a read
///
/// Falls back to the view's declared features when nothing was requested.
pub fn resolve_requested_features(
    table: &dyn FeatureViewSchema,
    requested_features: Option<&[String]>,
) -> Vec<String> {
    match requested_features {
        Some(names) if !names.is_empty() => names.to_vec(),
        _ => table.feature_names(),
    }
}
