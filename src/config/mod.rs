//! Configuration loading and management
//!
//! ```yaml
//! collections:
//!   users:
//!     remaps:
//!       id: _id
//!     filters:
//!       email: lowercase
//!       created_at: datetime
//!     attributes:
//!       name: {type: string, required: true}
//!       email: {type: string, enum: [{pattern: "@"}]}
//!       created_at: {type: datetime}
//! ```

use crate::adapter::{Adapter, DataAccessLayer};
use crate::core::error::ConfigError;
use crate::core::validation::{FilterSpec, FilterTable, Schema, SchemaValidator};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Settings of a single collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionConfig {
    /// Entity field → store field
    #[serde(default)]
    pub remaps: IndexMap<String, String>,

    /// Entity field → filter applied to records read back
    #[serde(default)]
    pub filters: IndexMap<String, FilterSpec>,

    /// Attribute schema of the collection's entities
    #[serde(default)]
    pub attributes: Schema,
}

impl CollectionConfig {
    pub fn filter_table(&self) -> FilterTable {
        self.filters
            .iter()
            .map(|(field, spec)| (field.clone(), spec.build()))
            .collect()
    }
}

/// Complete configuration of the data-access layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiasporaConfig {
    #[serde(default)]
    pub collections: IndexMap<String, CollectionConfig>,
}

impl DiasporaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.get(name)
    }

    /// Configure the remap and filter tables of every collection on `adapter`
    pub fn apply_to<A: Adapter + ?Sized>(&self, adapter: &A) -> Result<(), ConfigError> {
        for (name, collection) in &self.collections {
            adapter.configure_collection(name, collection.remaps.clone(), collection.filter_table())?;
        }
        info!(
            adapter = %adapter.name(),
            collections = self.collections.len(),
            "applied configuration"
        );
        Ok(())
    }

    /// Validator for the entities of `collection`, if it declares attributes
    pub fn validator(&self, collection: &str) -> Option<SchemaValidator> {
        self.collections
            .get(collection)
            .filter(|config| !config.attributes.is_empty())
            .map(|config| SchemaValidator::new(config.attributes.clone()))
    }

    /// Configure `adapter` and wrap it with one validator per collection
    pub fn build_layer<A: Adapter>(&self, adapter: A) -> Result<DataAccessLayer<A>, ConfigError> {
        self.apply_to(&adapter)?;
        let layer = self
            .collections
            .keys()
            .fold(DataAccessLayer::new(adapter), |layer, name| {
                match self.validator(name) {
                    Some(validator) => layer.with_validator(name.clone(), validator),
                    None => layer,
                }
            });
        Ok(layer)
    }
}
