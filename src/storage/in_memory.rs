//! In-memory adapter for testing and development

use crate::adapter::{Adapter, AdapterContext, Capabilities, Implemented};
use crate::core::error::Result;
use crate::core::matcher::matches;
use crate::core::query::{Query, QueryOptions};
use crate::core::value::{Record, Value};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Field that receives a generated identifier on insert
pub const ID_FIELD: &str = "id";

/// In-memory adapter
///
/// Collections are insertion-ordered vectors of records behind a RwLock,
/// matched with the predicate evaluator. Implements `insert_one`,
/// `find_one`, `update_many` and `delete_one`; the trait derives the rest.
/// Ready as soon as it is created.
#[derive(Clone)]
pub struct InMemoryAdapter {
    context: Arc<AdapterContext>,
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl InMemoryAdapter {
    pub const NAME: &'static str = "in-memory";

    pub fn new() -> Self {
        let context = AdapterContext::new(Self::NAME);
        context.lifecycle().mark_ready();
        Self {
            context: Arc::new(context),
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Snapshot of the records stored in `collection`, in store naming
    pub fn records(&self, collection: &str) -> Result<Vec<Record>> {
        let tables = self
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(tables.get(collection).cloned().unwrap_or_default())
    }
}

impl Default for InMemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for InMemoryAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            insert: Implemented::One,
            find: Implemented::One,
            update: Implemented::Many,
            delete: Implemented::One,
        }
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut entity: Record,
        _options: QueryOptions,
    ) -> Result<Option<Record>> {
        if entity.get(ID_FIELD).is_none_or(Value::is_null) {
            entity.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        tables
            .entry(collection.to_string())
            .or_default()
            .push(entity.clone());

        Ok(Some(entity))
    }

    async fn find_one(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        let tables = self
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(tables.get(collection).and_then(|records| {
            records
                .iter()
                .filter(|record| matches(record, query))
                .nth(options.skip)
                .cloned()
        }))
    }

    async fn update_many(
        &self,
        collection: &str,
        query: &Query,
        update: &Record,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(records) = tables.get_mut(collection) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter_mut()
            .filter(|record| matches(record, query))
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|record| {
                for (field, value) in update {
                    record.insert(field.clone(), value.clone());
                }
                record.clone()
            })
            .collect())
    }

    async fn delete_one(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<bool> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(records) = tables.get_mut(collection) else {
            return Ok(false);
        };

        let position = records
            .iter()
            .enumerate()
            .filter(|(_, record)| matches(record, query))
            .nth(options.skip)
            .map(|(index, _)| index);

        Ok(match position {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        })
    }
}
