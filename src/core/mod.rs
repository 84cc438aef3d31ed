//! Core module containing the query language, values and validation

pub mod error;
pub mod matcher;
pub mod operator;
pub mod query;
pub mod remap;
pub mod validation;
pub mod value;

pub use error::{
    AdapterError, ConfigError, DiasporaError, EntityValidationError, FieldPath, PathSegment,
    QueryError, Result, ValidationFailure,
};
pub use matcher::{matches, matches_condition};
pub use operator::Operator;
pub use query::{
    FieldCondition, Query, QueryOptions, RawQuery, RawQueryOptions, normalize_options,
    normalize_query,
};
pub use remap::RemapTable;
pub use validation::{FieldDescriptor, FieldType, Schema, SchemaValidator};
pub use value::{Record, Value, deep_equal};
