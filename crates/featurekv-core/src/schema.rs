//! Feature view schema
//!
//! The online store needs very little from the host's table definition: the
//! view's name (part of every key) and its declared feature names (the default
//! projection for reads). [`FeatureViewSchema`] is that narrow capability;
//! [`FeatureView`] is a plain implementation for callers without a registry.

use serde::{Deserialize, Serialize};

/// What the online store needs to know about a feature view
pub trait FeatureViewSchema: Send + Sync {
    fn name(&self) -> &str;

    /// Declared feature names, in declaration order
    fn feature_names(&self) -> Vec<String>;
}

/// Definition of a feature view
///
/// # Example
///
/// ```rust
/// use featurekv_core::{FeatureView, FeatureViewSchema};
///
/// let view = FeatureView::new("driver_stats")
///     .with_entity("driver_id")
///     .with_features(["conv_rate", "acc_rate"]);
/// assert_eq!(view.feature_names(), vec!["conv_rate", "acc_rate"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureView {
    /// Unique name within a project (e.g., "driver_stats")
    pub name: String,

    /// Join key names (e.g., ["driver_id"])
    #[serde(default)]
    pub entity_columns: Vec<String>,

    /// Feature names (e.g., ["conv_rate", "acc_rate"])
    #[serde(default)]
    pub feature_columns: Vec<String>,
}

impl FeatureView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_columns: Vec::new(),
            feature_columns: Vec::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>) -> Self {
        self.entity_columns.push(name.into());
        self
    }

    pub fn with_features<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_columns.extend(names.into_iter().map(Into::into));
        self
    }
}

impl FeatureViewSchema for FeatureView {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> Vec<String> {
        self.feature_columns.clone()
    }
}
