//! # Diaspora
//!
//! A storage-agnostic data-access layer. Application code describes entities
//! with a declarative attribute schema and issues CRUD operations through a
//! uniform query language; pluggable adapters translate it for a concrete
//! store.
//!
//! ## Features
//!
//! - **Query Language**: operators with shorthand aliases (`>=`, `!=`, `~`...),
//!   normalized into a canonical form before reaching a backend
//! - **Minimal Adapters**: implement one member of each CRUD pair, get the other
//! - **Predicate Evaluation**: in-memory matching of canonical queries
//! - **Schema Validation**: recursive type checks, casts, defaults and enums
//! - **Field Remapping**: per-collection entity ↔ store field names
//! - **Configuration-Based**: collections defined via YAML configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use diaspora::prelude::*;
//! use serde_json::json;
//!
//! let dal = DataAccessLayer::new(InMemoryAdapter::new());
//!
//! let alice = record_from_json(json!({"name": "Alice", "age": 31})).unwrap();
//! dal.insert_one("users", alice, &RawQueryOptions::new()).await?;
//!
//! let adults = dal
//!     .find_many(
//!         "users",
//!         &RawQuery::from_json(json!({"age": {">=": 18}}))?,
//!         &RawQueryOptions::new().with_limit(10),
//!     )
//!     .await?;
//! ```

pub mod adapter;
pub mod config;
pub mod core;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{
            AdapterError, ConfigError, DiasporaError, EntityValidationError, QueryError, Result,
        },
        matcher::matches,
        operator::Operator,
        query::{
            FieldCondition, Query, QueryOptions, RawQuery, RawQueryOptions, normalize_options,
            normalize_query,
        },
        remap::RemapTable,
        validation::{
            EnumMember, FieldDescriptor, FieldType, FilterSpec, FilterTable, Schema,
            SchemaValidator,
        },
        value::{Record, Value, deep_equal, record_from_json},
    };

    // === Adapters ===
    pub use crate::adapter::{
        Adapter, AdapterContext, AdapterState, Capabilities, DataAccessLayer, Implemented,
        iterate_limit,
    };

    // === Storage ===
    pub use crate::storage::InMemoryAdapter;

    // === Config ===
    pub use crate::config::{CollectionConfig, DiasporaConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
}
