//! # featurekv Core Library
//!
//! Key encoding and batch read/write protocol that maps a feature store's
//! logical schema (project, entity key, feature view, feature name) onto a flat
//! key-value namespace.
//!
//! ## Key Components
//!
//! - **Key Encoder** ([`key`]): injective `<project>:<entity key>:<view>:<field>` keys
//! - **Batch Writer** ([`writer`]): N+2 point puts per record
//! - **Batch Reader** ([`reader`]): point gets per entity, in input order
//! - **RawKv**: the get/put capability a substrate must provide
//! - **ValueCodec**: byte encoding of feature values and timestamp markers
//! - **OnlineStore**: the contract the host feature store talks to
//!
//! ## Example Usage
//!
//! ```rust
//! use featurekv_core::prelude::*;
//! use featurekv_core::{read_batch, write_batch, BincodeCodec, MemoryKv};
//! use chrono::{TimeZone, Utc};
//!
//! # tokio_test_block(async {
//! let kv = MemoryKv::new();
//! let record = FeatureRecord::new(
//!     EntityKey::new("driver_id", 1001_i64),
//!     Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
//! )
//! .with_feature("conv_rate", FeatureValue::Float(0.5));
//!
//! write_batch(&kv, &BincodeCodec, "demo", "driver_stats", &[record], None).await?;
//!
//! let rows = read_batch(
//!     &kv,
//!     &BincodeCodec,
//!     "demo",
//!     "driver_stats",
//!     &[EntityKey::new("driver_id", 1001_i64)],
//!     &["conv_rate".to_string()],
//! )
//! .await?;
//! assert_eq!(rows[0].as_ref().unwrap().get_feature("conv_rate"), Some(&FeatureValue::Float(0.5)));
//! # Ok::<(), featurekv_core::Error>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future<Output = featurekv_core::Result<()>>>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f).unwrap();
//! # }
//! ```

pub use codec::{BincodeCodec, CodecKind, JsonCodec, TimestampMarker, ValueCodec};
pub use error::{Error, Result};
pub use kv::{MemoryKv, RawKv};
pub use online_store::{resolve_requested_features, OnlineStore};
pub use reader::read_batch;
pub use schema::{FeatureView, FeatureViewSchema};
pub use types::{
    make_tzaware, to_naive_utc, EntityKey, EntityValue, FeatureRecord, FeatureRow, FeatureValue,
};
pub use writer::{write_batch, Progress};

pub mod codec;
mod error;
pub mod key;
pub mod kv;
mod online_store;
pub mod reader;
mod schema;
mod types;
pub mod writer;

// Users can do `use featurekv_core::prelude::*` to get everything they need
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::online_store::OnlineStore;
    pub use crate::schema::{FeatureView, FeatureViewSchema};
    pub use crate::types::{EntityKey, EntityValue, FeatureRecord, FeatureRow, FeatureValue};
}
