//! Adapter contract between the data-access layer and concrete stores
//!
//! A backend only has to implement one member of each CRUD pair; the
//! [`Adapter`] trait derives the other one:
//!
//! | Implemented    | Derived                                            |
//! |----------------|----------------------------------------------------|
//! | `insert_many`  | `insert_one` = first of `insert_many([entity])`    |
//! | `insert_one`   | `insert_many` = sequential `insert_one`            |
//! | `find_many`    | `find_one` = first of `find_many` with `limit = 1` |
//! | `find_one`     | `find_many` = pagination over `find_one`           |
//! | `update_many`  | `update_one` = first of `update_many` with `limit = 1` |
//! | `update_one`   | `update_many` = pagination over `update_one`       |
//! | `delete_many`  | `delete_one` = `delete_many` with `limit = 1`      |
//! | `delete_one`   | `delete_many` = `delete_one` until nothing matches |
//!
//! Queries and options reaching an adapter are always canonical; see
//! [`DataAccessLayer`] for the application-facing entry point.

pub mod context;
pub mod data_access;
pub mod lifecycle;

pub use context::{AdapterContext, CollectionSettings};
pub use data_access::DataAccessLayer;
pub use lifecycle::{AdapterState, Lifecycle};

use crate::core::error::{AdapterError, ConfigError, DiasporaError, QueryError, Result};
use crate::core::query::{Query, QueryOptions, RawQuery, RawQueryOptions};
use crate::core::validation::FilterTable;
use crate::core::value::Record;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::future::Future;
use tracing::trace;

/// Which member(s) of a CRUD pair a backend really implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implemented {
    One,
    Many,
    Both,
}

impl Implemented {
    pub fn one(self) -> bool {
        matches!(self, Implemented::One | Implemented::Both)
    }

    pub fn many(self) -> bool {
        matches!(self, Implemented::Many | Implemented::Both)
    }
}

/// Native primitives of a backend, per CRUD family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub insert: Implemented,
    pub find: Implemented,
    pub update: Implemented,
    pub delete: Implemented,
}

impl Capabilities {
    /// Every operation is native
    pub const ALL: Self = Self::uniform(Implemented::Both);

    pub const fn uniform(implemented: Implemented) -> Self {
        Self {
            insert: implemented,
            find: implemented,
            update: implemented,
            delete: implemented,
        }
    }
}

fn missing_primitive(adapter: &str, operation: &'static str) -> DiasporaError {
    AdapterError::MissingPrimitive {
        adapter: adapter.to_string(),
        operation,
    }
    .into()
}

/// Storage backend contract
///
/// Implementors provide `name`, `context` and `capabilities`, then override
/// the CRUD methods their [`Capabilities`] declare. A provided method whose
/// sibling is not declared returns [`AdapterError::MissingPrimitive`].
/// Declaring a family as [`Implemented::Both`] without overriding either
/// method makes the two defaults call each other forever.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Adapter name, used in logs and errors
    fn name(&self) -> &str;

    /// Lifecycle and collection settings
    fn context(&self) -> &AdapterContext;

    fn capabilities(&self) -> Capabilities;

    // === Setup ===

    /// Wait until the adapter is usable
    async fn wait_ready(&self) -> Result<()> {
        Ok(self.context().lifecycle().wait_ready().await?)
    }

    fn configure_collection(
        &self,
        collection: &str,
        remaps: IndexMap<String, String>,
        filters: FilterTable,
    ) -> std::result::Result<(), ConfigError> {
        self.context().configure_collection(collection, remaps, filters)
    }

    fn normalize_options(&self, raw: &RawQueryOptions) -> std::result::Result<QueryOptions, QueryError> {
        crate::core::query::normalize_options(raw)
    }

    fn normalize_query(
        &self,
        raw: &RawQuery,
        options: &QueryOptions,
    ) -> std::result::Result<Query, QueryError> {
        crate::core::query::normalize_query(raw, options)
    }

    // === Insert ===

    /// Insert a single entity, returning it as stored
    async fn insert_one(
        &self,
        collection: &str,
        entity: Record,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        if !self.capabilities().insert.many() {
            return Err(missing_primitive(self.name(), "insert_one"));
        }
        let inserted = self.insert_many(collection, vec![entity], options).await?;
        Ok(inserted.into_iter().next())
    }

    /// Insert entities in order, returning those the store accepted
    async fn insert_many(
        &self,
        collection: &str,
        entities: Vec<Record>,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        if !self.capabilities().insert.one() {
            return Err(missing_primitive(self.name(), "insert_many"));
        }
        let mut inserted = Vec::with_capacity(entities.len());
        for entity in entities {
            if let Some(record) = self.insert_one(collection, entity, options).await? {
                inserted.push(record);
            }
        }
        Ok(inserted)
    }

    // === Find ===

    /// Find the first record matching `query` after `options.skip`
    async fn find_one(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        if !self.capabilities().find.many() {
            return Err(missing_primitive(self.name(), "find_one"));
        }
        let found = self
            .find_many(collection, query, QueryOptions { limit: Some(1), ..options })
            .await?;
        Ok(found.into_iter().next())
    }

    /// Find up to `options.limit` records matching `query`
    async fn find_many(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        if !self.capabilities().find.one() {
            return Err(missing_primitive(self.name(), "find_many"));
        }
        iterate_limit(options, |step| self.find_one(collection, query, step)).await
    }

    // === Update ===

    /// Merge `update` into the first matching record, returning it
    async fn update_one(
        &self,
        collection: &str,
        query: &Query,
        update: &Record,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        if !self.capabilities().update.many() {
            return Err(missing_primitive(self.name(), "update_one"));
        }
        let updated = self
            .update_many(collection, query, update, QueryOptions { limit: Some(1), ..options })
            .await?;
        Ok(updated.into_iter().next())
    }

    /// Merge `update` into up to `options.limit` matching records
    ///
    /// The derived version pages with a rolling skip, so an update that
    /// makes records stop matching `query` shifts the pages it walks.
    async fn update_many(
        &self,
        collection: &str,
        query: &Query,
        update: &Record,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        if !self.capabilities().update.one() {
            return Err(missing_primitive(self.name(), "update_many"));
        }
        iterate_limit(options, |step| self.update_one(collection, query, update, step)).await
    }

    // === Delete ===

    /// Delete the first matching record; `true` if one was removed
    async fn delete_one(&self, collection: &str, query: &Query, options: QueryOptions) -> Result<bool> {
        if !self.capabilities().delete.many() {
            return Err(missing_primitive(self.name(), "delete_one"));
        }
        let deleted = self
            .delete_many(collection, query, QueryOptions { limit: Some(1), ..options })
            .await?;
        Ok(deleted > 0)
    }

    /// Delete up to `options.limit` matching records, returning the count
    ///
    /// Deleted records leave the match set, so every step reuses the
    /// original skip.
    async fn delete_many(&self, collection: &str, query: &Query, options: QueryOptions) -> Result<usize> {
        if !self.capabilities().delete.one() {
            return Err(missing_primitive(self.name(), "delete_many"));
        }
        let step = QueryOptions { limit: Some(1), ..options };
        let mut deleted = 0;
        while !options.limit_reached(deleted) {
            trace!(adapter = %self.name(), collection, skip = step.skip, deleted, "delete step");
            if !self.delete_one(collection, query, step).await? {
                break;
            }
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Collect records one at a time with a rolling skip
///
/// Calls `step` with `skip = options.skip + found so far` until `options.limit`
/// records are collected or a step returns nothing. Steps run strictly in
/// sequence; results keep their order.
pub async fn iterate_limit<F, Fut>(options: QueryOptions, mut step: F) -> Result<Vec<Record>>
where
    F: FnMut(QueryOptions) -> Fut,
    Fut: Future<Output = Result<Option<Record>>>,
{
    let mut found = Vec::new();
    while !options.limit_reached(found.len()) {
        let local = QueryOptions {
            skip: options.skip + found.len(),
            limit: Some(1),
            ..options
        };
        trace!(skip = local.skip, found = found.len(), "pagination step");
        match step(local).await? {
            Some(record) => found.push(record),
            None => break,
        }
    }
    Ok(found)
}
