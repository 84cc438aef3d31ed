//! Shared test harness for adapter testing
//!
//! Provides two minimal adapters that implement exactly one member of each
//! CRUD pair (`OneOnlyAdapter`, `ManyOnlyAdapter`) and record the calls the
//! derived methods make, plus record helpers and the `adapter_contract_tests!`
//! conformance suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod adapter_harness;
//! use adapter_harness::*;
//! ```

#![allow(dead_code, unused_macros)]

#[macro_use]
mod contract_tests;

use async_trait::async_trait;
use diaspora::adapter::{Adapter, AdapterContext, Capabilities, Implemented};
use diaspora::core::error::Result;
use diaspora::core::matcher::matches;
use diaspora::core::query::{Query, QueryOptions};
use diaspora::core::value::{Record, Value, record_from_json};
use std::collections::HashMap;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

/// Build a record from a JSON object literal
pub fn record(value: serde_json::Value) -> Record {
    record_from_json(value).expect("test record must be a JSON object")
}

pub fn person(name: &str, age: i64) -> Record {
    record(serde_json::json!({ "name": name, "age": age }))
}

/// Five people aged 10, 20, 30, 40, 50, named `p0`..`p4`
pub fn people() -> Vec<Record> {
    (0..5).map(|i| person(&format!("p{}", i), (i + 1) * 10)).collect()
}

/// The `name` attribute of each record, in order
pub fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("name").and_then(Value::as_str).unwrap_or_default().to_string())
        .collect()
}

pub fn assert_names(records: &[Record], expected: &[&str]) {
    assert_eq!(
        names(records),
        expected.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "Unexpected records returned"
    );
}

// ---------------------------------------------------------------------------
// Call recording
// ---------------------------------------------------------------------------

/// A primitive invocation observed by a test adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub skip: usize,
    pub limit: Option<usize>,
}

#[derive(Default)]
struct Store {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    calls: Mutex<Vec<Call>>,
}

impl Store {
    fn record_call(&self, operation: &'static str, options: &QueryOptions) {
        self.calls.lock().unwrap().push(Call {
            operation,
            skip: options.skip,
            limit: options.limit,
        });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, collection: &str, entity: Record) -> Record {
        self.tables
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(entity.clone());
        entity
    }

    /// Indexes of the matching records, after `skip`, at most `limit`
    fn matching(&self, collection: &str, query: &Query, options: &QueryOptions) -> Vec<usize> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| matches(r, query))
                    .map(|(i, _)| i)
                    .skip(options.skip)
                    .take(options.limit.unwrap_or(usize::MAX))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get(&self, collection: &str, indexes: &[usize]) -> Vec<Record> {
        let tables = self.tables.lock().unwrap();
        indexes
            .iter()
            .map(|&i| tables[collection][i].clone())
            .collect()
    }

    fn update(&self, collection: &str, indexes: &[usize], update: &Record) -> Vec<Record> {
        let mut tables = self.tables.lock().unwrap();
        let Some(records) = tables.get_mut(collection) else {
            return Vec::new();
        };
        indexes
            .iter()
            .map(|&i| {
                for (field, value) in update {
                    records[i].insert(field.clone(), value.clone());
                }
                records[i].clone()
            })
            .collect()
    }

    fn remove(&self, collection: &str, indexes: &[usize]) -> usize {
        let mut tables = self.tables.lock().unwrap();
        let Some(records) = tables.get_mut(collection) else {
            return 0;
        };
        for &i in indexes.iter().rev() {
            records.remove(i);
        }
        indexes.len()
    }
}

// ---------------------------------------------------------------------------
// OneOnlyAdapter: implements insert_one, find_one, update_one, delete_one
// ---------------------------------------------------------------------------

pub struct OneOnlyAdapter {
    context: AdapterContext,
    store: Store,
}

impl OneOnlyAdapter {
    pub const NAME: &'static str = "one-only";

    /// A ready adapter
    pub fn new() -> Self {
        let adapter = Self::preparing();
        adapter.context.lifecycle().mark_ready();
        adapter
    }

    /// An adapter still in the `Preparing` state
    pub fn preparing() -> Self {
        Self {
            context: AdapterContext::new(Self::NAME),
            store: Store::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store.calls()
    }
}

#[async_trait]
impl Adapter for OneOnlyAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::uniform(Implemented::One)
    }

    async fn insert_one(
        &self,
        collection: &str,
        entity: Record,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        self.store.record_call("insert_one", &options);
        Ok(Some(self.store.push(collection, entity)))
    }

    async fn find_one(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        self.store.record_call("find_one", &options);
        let found = self
            .store
            .matching(collection, query, &options.with_limit(1));
        Ok(self.store.get(collection, &found).into_iter().next())
    }

    async fn update_one(
        &self,
        collection: &str,
        query: &Query,
        update: &Record,
        options: QueryOptions,
    ) -> Result<Option<Record>> {
        self.store.record_call("update_one", &options);
        let found = self
            .store
            .matching(collection, query, &options.with_limit(1));
        Ok(self.store.update(collection, &found, update).into_iter().next())
    }

    async fn delete_one(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<bool> {
        self.store.record_call("delete_one", &options);
        let found = self
            .store
            .matching(collection, query, &options.with_limit(1));
        Ok(self.store.remove(collection, &found) > 0)
    }
}

// ---------------------------------------------------------------------------
// ManyOnlyAdapter: implements insert_many, find_many, update_many, delete_many
// ---------------------------------------------------------------------------

pub struct ManyOnlyAdapter {
    context: AdapterContext,
    store: Store,
}

impl ManyOnlyAdapter {
    pub const NAME: &'static str = "many-only";

    pub fn new() -> Self {
        let context = AdapterContext::new(Self::NAME);
        context.lifecycle().mark_ready();
        Self {
            context,
            store: Store::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.store.calls()
    }
}

#[async_trait]
impl Adapter for ManyOnlyAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::uniform(Implemented::Many)
    }

    async fn insert_many(
        &self,
        collection: &str,
        entities: Vec<Record>,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        self.store.record_call("insert_many", &options);
        Ok(entities
            .into_iter()
            .map(|entity| self.store.push(collection, entity))
            .collect())
    }

    async fn find_many(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        self.store.record_call("find_many", &options);
        let found = self.store.matching(collection, query, &options);
        Ok(self.store.get(collection, &found))
    }

    async fn update_many(
        &self,
        collection: &str,
        query: &Query,
        update: &Record,
        options: QueryOptions,
    ) -> Result<Vec<Record>> {
        self.store.record_call("update_many", &options);
        let found = self.store.matching(collection, query, &options);
        Ok(self.store.update(collection, &found, update))
    }

    async fn delete_many(
        &self,
        collection: &str,
        query: &Query,
        options: QueryOptions,
    ) -> Result<usize> {
        self.store.record_call("delete_many", &options);
        let found = self.store.matching(collection, query, &options);
        Ok(self.store.remove(collection, &found))
    }
}

// ---------------------------------------------------------------------------
// UndeclaredAdapter: declares `One` everywhere but implements nothing
// ---------------------------------------------------------------------------

pub struct UndeclaredAdapter {
    context: AdapterContext,
}

impl UndeclaredAdapter {
    pub fn new() -> Self {
        let context = AdapterContext::new("undeclared");
        context.lifecycle().mark_ready();
        Self { context }
    }
}

#[async_trait]
impl Adapter for UndeclaredAdapter {
    fn name(&self) -> &str {
        "undeclared"
    }

    fn context(&self) -> &AdapterContext {
        &self.context
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::uniform(Implemented::One)
    }
}
