//! Per-adapter state shared by every CRUD call

use super::lifecycle::Lifecycle;
use crate::core::error::ConfigError;
use crate::core::query::Query;
use crate::core::remap::RemapTable;
use crate::core::validation::{FilterTable, apply_filters};
use crate::core::value::Record;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Remap and filter tables of one collection
#[derive(Clone, Default)]
pub struct CollectionSettings {
    pub remap: RemapTable,
    pub filters: FilterTable,
}

impl std::fmt::Debug for CollectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSettings")
            .field("remap", &self.remap)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lifecycle plus collection settings of an adapter instance
///
/// Collections are configured during setup; afterwards the tables are
/// only read. An unconfigured collection is left untouched by remapping
/// and filtering.
#[derive(Debug)]
pub struct AdapterContext {
    lifecycle: Lifecycle,
    collections: RwLock<HashMap<String, Arc<CollectionSettings>>>,
}

impl AdapterContext {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            lifecycle: Lifecycle::new(adapter),
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Build and store the remap and filter tables of `collection`
    ///
    /// Re-configuring a collection replaces its previous tables.
    pub fn configure_collection(
        &self,
        collection: &str,
        remaps: IndexMap<String, String>,
        filters: FilterTable,
    ) -> Result<(), ConfigError> {
        let remap = RemapTable::new(collection, remaps)?;
        debug!(
            adapter = %self.lifecycle.adapter(),
            collection,
            remaps = remap.normal().len(),
            filters = filters.len(),
            "configured collection"
        );
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_string(), Arc::new(CollectionSettings { remap, filters }));
        Ok(())
    }

    pub fn settings(&self, collection: &str) -> Option<Arc<CollectionSettings>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
    }

    /// Rename record keys from entity to store names
    pub fn remap_input(&self, collection: &str, record: Record) -> Record {
        match self.settings(collection) {
            Some(settings) => settings.remap.remap_input(record),
            None => record,
        }
    }

    /// Rename record keys from store to entity names
    pub fn remap_output(&self, collection: &str, record: Record) -> Record {
        match self.settings(collection) {
            Some(settings) => settings.remap.remap_output(record),
            None => record,
        }
    }

    /// Rename canonical query fields to store names
    pub fn remap_query(&self, collection: &str, query: Query) -> Query {
        match self.settings(collection) {
            Some(settings) => settings.remap.remap_query(query),
            None => query,
        }
    }

    /// Run the collection's filters over a record read from the store
    pub fn apply_filters(&self, collection: &str, record: Record) -> anyhow::Result<Record> {
        match self.settings(collection) {
            Some(settings) => apply_filters(&settings.filters, record),
            None => Ok(record),
        }
    }
}
