//! featurekv Online Store - feature serving on raw key-value substrates
//!
//! This crate plugs the featurekv key encoding and batch protocol into real
//! substrates and exposes it through the host [`OnlineStore`] contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Online Feature Serving                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   featurekv.yaml ──► RepoConfig ──► RawKvOnlineStore             │
//! │                                          │                       │
//! │                                          │ OnceCell (first use)  │
//! │                                          ▼                       │
//! │                                     KvBackend                    │
//! │                           ┌──────────────┼──────────────┐        │
//! │                           ▼              ▼              ▼        │
//! │                      TiKV (raw)        Redis         Memory      │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use featurekv_online::{config, EntityKey, OnlineStore, RawKvOnlineStore};
//!
//! let repo = config::load("featurekv.yaml")?;
//! let store = RawKvOnlineStore::new(repo.online_store.clone())?;
//!
//! let view = repo.feature_view("driver_stats").expect("declared view");
//! let rows = store
//!     .online_read(&repo.project, view, &[EntityKey::new("driver_id", 1001_i64)], None)
//!     .await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `redis` (default): Enable the Redis substrate
//! - `tikv`: Enable the TiKV raw-mode substrate
//! - `all`: Enable all substrates

// Re-export core types
pub use featurekv_core::{
    EntityKey, EntityValue, FeatureRecord, FeatureRow, FeatureValue, FeatureView,
    FeatureViewSchema, MemoryKv, OnlineStore, RawKv,
};

pub mod backend;
pub mod config;
mod store;

pub use backend::KvBackend;
pub use config::{BackendKind, OnlineStoreConfig, RepoConfig, StoreMode};
pub use store::RawKvOnlineStore;

// Redis substrate (default feature)
#[cfg(feature = "redis")]
pub mod redis_store;
#[cfg(feature = "redis")]
pub use redis_store::RedisKv;

// TiKV substrate (optional feature)
#[cfg(feature = "tikv")]
pub mod tikv_store;
#[cfg(feature = "tikv")]
pub use tikv_store::TikvKv;
