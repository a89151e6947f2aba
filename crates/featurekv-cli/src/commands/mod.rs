//! CLI command implementations

pub mod ping;
pub mod read;
pub mod write;

use anyhow::{Context, Result};
use featurekv_online::{RawKvOnlineStore, RepoConfig};

/// Create the online store from config
///
/// Validates the store settings only; the connection opens on first use.
pub fn create_store(config: &RepoConfig) -> Result<RawKvOnlineStore> {
    RawKvOnlineStore::new(config.online_store.clone()).with_context(|| {
        format!(
            "Invalid online store configuration for project '{}'",
            config.project
        )
    })
}
