//! Configuration management
//!
//! A repository is described by a YAML file (`featurekv.yaml`):
//!
//! ```yaml
//! project: demo
//!
//! online_store:
//!   type: tikv                                    # tikv | redis | memory
//!   mode: rawkv
//!   pd_addresses: "127.0.0.1:2379,127.0.0.2:2379"
//!   codec: bincode                                # bincode | json
//!
//! feature_views:
//!   - name: driver_stats
//!     entity_columns: [driver_id]
//!     feature_columns: [conv_rate, acc_rate]
//! ```
//!
//! For `redis`, `pd_addresses` holds the connection URL. `memory` ignores it.

use featurekv_core::{CodecKind, Error, FeatureView, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which substrate backs the online store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// TiKV in raw (non-transactional) mode
    #[default]
    Tikv,
    Redis,
    /// Process-local map, for tests and dry runs
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Tikv => "tikv",
            BackendKind::Redis => "redis",
            BackendKind::Memory => "memory",
        }
    }

    /// True if the backend needs `pd_addresses`
    pub fn is_networked(&self) -> bool {
        !matches!(self, BackendKind::Memory)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access mode of the substrate
///
/// Only raw key-value access is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    RawKv,
}

impl StoreMode {
    /// Parses the `mode` setting (case-insensitive)
    pub fn parse(mode: Option<&str>) -> Result<Self> {
        match mode {
            Some(m) if m.trim().eq_ignore_ascii_case("rawkv") => Ok(StoreMode::RawKv),
            Some(m) => Err(Error::config(format!(
                "unsupported online store mode '{}', only 'rawkv' is supported",
                m
            ))),
            None => Err(Error::config("online store mode is not set, expected 'rawkv'")),
        }
    }
}

/// Online store section of the repository config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnlineStoreConfig {
    /// Backend type (default: tikv)
    #[serde(rename = "type", default)]
    pub backend: BackendKind,

    /// Access mode, must be "rawkv"
    #[serde(default)]
    pub mode: Option<String>,

    /// Comma-separated PD endpoints (tikv) or connection URL (redis)
    #[serde(default)]
    pub pd_addresses: Option<String>,

    /// Value codec (default: bincode)
    #[serde(default)]
    pub codec: CodecKind,
}

impl Default for OnlineStoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            mode: Some("rawkv".to_string()),
            pd_addresses: None,
            codec: CodecKind::default(),
        }
    }
}

impl OnlineStoreConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    pub fn with_pd_addresses(mut self, addresses: impl Into<String>) -> Self {
        self.pd_addresses = Some(addresses.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    pub fn store_mode(&self) -> Result<StoreMode> {
        StoreMode::parse(self.mode.as_deref())
    }

    /// Endpoints from `pd_addresses`, split on commas
    pub fn endpoints(&self) -> Vec<String> {
        self.pd_addresses
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Checks everything that can be checked without I/O
    pub fn validate(&self) -> Result<StoreMode> {
        let mode = self.store_mode()?;
        if self.backend.is_networked() && self.endpoints().is_empty() {
            return Err(Error::config(format!(
                "online store type '{}' requires pd_addresses",
                self.backend
            )));
        }
        Ok(mode)
    }
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoConfig {
    /// Project namespace, the first segment of every key
    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default)]
    pub online_store: OnlineStoreConfig,

    /// Declared feature views
    #[serde(default)]
    pub feature_views: Vec<FeatureView>,
}

fn default_project() -> String {
    "default".to_string()
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            online_store: OnlineStoreConfig::default(),
            feature_views: Vec::new(),
        }
    }
}

impl RepoConfig {
    pub fn feature_view(&self, name: &str) -> Option<&FeatureView> {
        self.feature_views.iter().find(|v| v.name == name)
    }
}

/// Load configuration from a YAML file
///
/// # Example
///
/// ```rust,ignore
/// let config = load("featurekv.yaml")?;
/// println!("Project {} on {}", config.project, config.online_store.backend);
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<RepoConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read '{}': {}", path.display(), e))
    })?;

    let config: RepoConfig = serde_yaml::from_str(&contents).map_err(|e| {
        Error::config(format!("failed to parse '{}': {}", path.display(), e))
    })?;

    tracing::info!(
        path = %path.display(),
        project = %config.project,
        backend = %config.online_store.backend,
        "Loaded configuration"
    );

    Ok(config)
}

/// Like [`load`], but falls back to defaults if the file does not exist
pub fn load_or_default(path: impl AsRef<Path>) -> Result<RepoConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!("Configuration file '{}' not found, using defaults", path.display());
        return Ok(RepoConfig::default());
    }
    load(path)
}
