//! Application-facing façade over an [`Adapter`]

use super::Adapter;
use crate::core::error::Result;
use crate::core::query::{Query, QueryOptions, RawQuery, RawQueryOptions};
use crate::core::validation::SchemaValidator;
use crate::core::value::Record;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Entry point for application code
///
/// Takes raw queries and options, normalizes them, remaps query fields and
/// written entities to store names (when `remapInput`), waits for the
/// adapter, and remaps then filters the records it returns (when
/// `remapOutput`). Collections with a registered [`SchemaValidator`] have
/// inserted entities validated first.
///
/// # Example
/// ```rust,ignore
/// let dal = DataAccessLayer::new(InMemoryAdapter::new());
/// dal.insert_one("users", user, &RawQueryOptions::new()).await?;
/// let adults = dal
///     .find_many("users", &RawQuery::new().with("age", json!({">=": 18})), &RawQueryOptions::new())
///     .await?;
/// ```
pub struct DataAccessLayer<A: Adapter> {
    adapter: Arc<A>,
    validators: HashMap<String, SchemaValidator>,
}

impl<A: Adapter> DataAccessLayer<A> {
    pub fn new(adapter: A) -> Self {
        Self::from_arc(Arc::new(adapter))
    }

    pub fn from_arc(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            validators: HashMap::new(),
        }
    }

    /// Validate entities inserted into `collection`
    pub fn with_validator(mut self, collection: impl Into<String>, validator: SchemaValidator) -> Self {
        self.validators.insert(collection.into(), validator);
        self
    }

    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    pub fn validator(&self, collection: &str) -> Option<&SchemaValidator> {
        self.validators.get(collection)
    }

    // === Insert ===

    pub async fn insert_one(
        &self,
        collection: &str,
        entity: Record,
        raw_options: &RawQueryOptions,
    ) -> Result<Option<Record>> {
        let options = self.prepare_options(raw_options).await?;
        let entity = self.input_entity(collection, entity, &options)?;
        let inserted = self.adapter.insert_one(collection, entity, options).await?;
        inserted
            .map(|record| self.output_record(collection, record, &options))
            .transpose()
    }

    pub async fn insert_many(
        &self,
        collection: &str,
        entities: Vec<Record>,
        raw_options: &RawQueryOptions,
    ) -> Result<Vec<Record>> {
        let options = self.prepare_options(raw_options).await?;
        let entities = entities
            .into_iter()
            .map(|entity| self.input_entity(collection, entity, &options))
            .collect::<Result<Vec<_>>>()?;
        let inserted = self.adapter.insert_many(collection, entities, options).await?;
        self.output_records(collection, inserted, &options)
    }

    // === Find ===

    pub async fn find_one(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        raw_options: &RawQueryOptions,
    ) -> Result<Option<Record>> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        let found = self.adapter.find_one(collection, &query, options).await?;
        found
            .map(|record| self.output_record(collection, record, &options))
            .transpose()
    }

    pub async fn find_many(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        raw_options: &RawQueryOptions,
    ) -> Result<Vec<Record>> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        let found = self.adapter.find_many(collection, &query, options).await?;
        self.output_records(collection, found, &options)
    }

    // === Update ===

    pub async fn update_one(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        update: Record,
        raw_options: &RawQueryOptions,
    ) -> Result<Option<Record>> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        let update = self.input_record(collection, update, &options);
        let updated = self
            .adapter
            .update_one(collection, &query, &update, options)
            .await?;
        updated
            .map(|record| self.output_record(collection, record, &options))
            .transpose()
    }

    pub async fn update_many(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        update: Record,
        raw_options: &RawQueryOptions,
    ) -> Result<Vec<Record>> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        let update = self.input_record(collection, update, &options);
        let updated = self
            .adapter
            .update_many(collection, &query, &update, options)
            .await?;
        self.output_records(collection, updated, &options)
    }

    // === Delete ===

    pub async fn delete_one(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        raw_options: &RawQueryOptions,
    ) -> Result<bool> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        self.adapter.delete_one(collection, &query, options).await
    }

    pub async fn delete_many(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        raw_options: &RawQueryOptions,
    ) -> Result<usize> {
        let (query, options) = self.prepare(collection, raw_query, raw_options).await?;
        self.adapter.delete_many(collection, &query, options).await
    }

    // === Helpers ===

    async fn prepare_options(&self, raw_options: &RawQueryOptions) -> Result<QueryOptions> {
        let options = self.adapter.normalize_options(raw_options)?;
        self.adapter.wait_ready().await?;
        Ok(options)
    }

    async fn prepare(
        &self,
        collection: &str,
        raw_query: &RawQuery,
        raw_options: &RawQueryOptions,
    ) -> Result<(Query, QueryOptions)> {
        let options = self.prepare_options(raw_options).await?;
        let mut query = self.adapter.normalize_query(raw_query, &options)?;
        if options.remap_input {
            query = self.adapter.context().remap_query(collection, query);
        }
        debug!(
            adapter = %self.adapter.name(),
            collection,
            fields = query.len(),
            skip = options.skip,
            limit = ?options.limit,
            "prepared query"
        );
        Ok((query, options))
    }

    fn input_entity(&self, collection: &str, entity: Record, options: &QueryOptions) -> Result<Record> {
        let entity = match self.validators.get(collection) {
            Some(validator) => validator.apply(&entity)?,
            None => entity,
        };
        Ok(self.input_record(collection, entity, options))
    }

    fn input_record(&self, collection: &str, record: Record, options: &QueryOptions) -> Record {
        if options.remap_input {
            self.adapter.context().remap_input(collection, record)
        } else {
            record
        }
    }

    fn output_record(&self, collection: &str, record: Record, options: &QueryOptions) -> Result<Record> {
        if !options.remap_output {
            return Ok(record);
        }
        let context = self.adapter.context();
        let record = context.remap_output(collection, record);
        Ok(context.apply_filters(collection, record)?)
    }

    fn output_records(
        &self,
        collection: &str,
        records: Vec<Record>,
        options: &QueryOptions,
    ) -> Result<Vec<Record>> {
        records
            .into_iter()
            .map(|record| self.output_record(collection, record, options))
            .collect()
    }
}
