//! Bidirectional field-name translation between entities and stores

use crate::core::error::ConfigError;
use crate::core::query::Query;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Per-collection remap table
///
/// `normal` maps entity fields to store fields, `inverted` is its exact
/// inverse. Fields missing from the table keep their name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    normal: IndexMap<String, String>,
    inverted: IndexMap<String, String>,
}

impl RemapTable {
    /// Build the table for `collection` from an entity → store mapping
    ///
    /// # Errors
    /// [`ConfigError::DuplicateRemap`] if two entity fields share a store
    /// field, since the inverse would not be exact.
    pub fn new(collection: &str, normal: IndexMap<String, String>) -> Result<Self, ConfigError> {
        let mut inverted = IndexMap::with_capacity(normal.len());
        for (entity_field, store_field) in &normal {
            if let Some(first) = inverted.insert(store_field.clone(), entity_field.clone()) {
                return Err(ConfigError::DuplicateRemap {
                    collection: collection.to_string(),
                    first,
                    second: entity_field.clone(),
                    target: store_field.clone(),
                });
            }
        }
        Ok(Self { normal, inverted })
    }

    pub fn normal(&self) -> &IndexMap<String, String> {
        &self.normal
    }

    pub fn inverted(&self) -> &IndexMap<String, String> {
        &self.inverted
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }

    /// Store-side name of an entity field
    pub fn to_store<'a>(&'a self, field: &'a str) -> &'a str {
        self.normal.get(field).map_or(field, String::as_str)
    }

    /// Entity-side name of a store field
    pub fn to_entity<'a>(&'a self, field: &'a str) -> &'a str {
        self.inverted.get(field).map_or(field, String::as_str)
    }

    /// Rename keys from entity to store names
    ///
    /// A key that is already named like the store side of a remapped key
    /// present in `map` is dropped: the remapped field wins.
    pub fn remap_input<V>(&self, map: IndexMap<String, V>) -> IndexMap<String, V> {
        rename_keys(map, &self.normal)
    }

    /// Rename keys from store to entity names
    ///
    /// Collisions resolve like [`remap_input`](Self::remap_input).
    pub fn remap_output<V>(&self, map: IndexMap<String, V>) -> IndexMap<String, V> {
        rename_keys(map, &self.inverted)
    }

    /// Rename the fields of a canonical query to store names
    pub fn remap_query(&self, query: Query) -> Query {
        query.map_fields(|field| self.to_store(field).to_string())
    }
}

fn rename_keys<V>(map: IndexMap<String, V>, table: &IndexMap<String, String>) -> IndexMap<String, V> {
    if table.is_empty() {
        return map;
    }
    let shadowed: HashSet<String> = map
        .keys()
        .filter_map(|key| table.get(key))
        .cloned()
        .collect();
    map.into_iter()
        .filter_map(|(key, value)| match table.get(&key) {
            Some(renamed) => Some((renamed.clone(), value)),
            None if shadowed.contains(&key) => None,
            None => Some((key, value)),
        })
        .collect()
}
