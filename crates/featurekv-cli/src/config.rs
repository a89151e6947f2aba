//! CLI configuration handling

use anyhow::{Context, Result};
use featurekv_core::FeatureView;
use featurekv_online::{config, RepoConfig};
use std::path::Path;

/// Places searched when `--config` is not given
const DEFAULT_LOCATIONS: [&str; 4] = [
    "featurekv.yaml",
    "featurekv.yml",
    ".featurekv/config.yaml",
    ".featurekv/config.yml",
];

/// Load configuration from file or defaults
///
/// `project` overrides the project named in the file.
pub fn load_config(config_path: Option<&str>, project: Option<&str>) -> Result<RepoConfig> {
    let mut repo = match config_path {
        Some(path) => load_from_file(path)?,
        None => match DEFAULT_LOCATIONS.iter().find(|l| Path::new(l).exists()) {
            Some(location) => load_from_file(location)?,
            None => {
                tracing::debug!("No configuration file found, using defaults");
                RepoConfig::default()
            }
        },
    };

    if let Some(project) = project {
        repo.project = project.to_string();
    }
    Ok(repo)
}

fn load_from_file(path: &str) -> Result<RepoConfig> {
    config::load(path).with_context(|| format!("Failed to load config file: {}", path))
}

/// Looks up a declared feature view, or an undeclared one with no features
pub fn resolve_view(repo: &RepoConfig, name: &str) -> FeatureView {
    match repo.feature_view(name) {
        Some(view) => view.clone(),
        None => {
            tracing::debug!(feature_view = name, "Feature view not declared in config");
            FeatureView::new(name)
        }
    }
}
