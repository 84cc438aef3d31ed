//! Validation and filtering system
//!
//! Entities are checked against a declarative tree of [`FieldDescriptor`]s
//! before they are written, and records read back from a store go through
//! per-field [`FieldFilter`]s.

pub mod checker;
pub mod descriptor;
pub mod filters;

pub use checker::SchemaValidator;
pub use descriptor::{ElementSpec, EnumMember, FieldDescriptor, FieldKind, FieldType, Schema};
pub use filters::{FieldFilter, FilterSpec, FilterTable, apply_filters};
