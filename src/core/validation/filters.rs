//! Per-field cast filters
//!
//! Filters run on records read back from a store, after output remapping,
//! so that stored representations (strings, epoch millis...) come back as
//! the values the application expects.

use crate::core::value::{Record, Value};
use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// A cast function applied to one field: `(field name, value) -> value`
pub type FieldFilter = Arc<dyn Fn(&str, Value) -> Result<Value> + Send + Sync>;

/// Entity field → filter
pub type FilterTable = IndexMap<String, FieldFilter>;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        other => Ok(other),
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        other => Ok(other),
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Ok(other),
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    move |_: &str, value: Value| match value.as_f64() {
        Some(num) => {
            let factor = 10_f64.powi(decimals as i32);
            Ok(Value::Float((num * factor).round() / factor))
        }
        None => Ok(value),
    }
}

/// Filter: parse RFC 3339 strings and epoch milliseconds into dates
///
/// Null stays null; anything else that can't be read as a date is an error.
pub fn datetime() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |field: &str, value: Value| match value {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|date| Value::DateTime(date.with_timezone(&Utc)))
            .map_err(|e| anyhow!("Field '{}': invalid date '{}': {}", field, s, e)),
        Value::Integer(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(Value::DateTime)
            .ok_or_else(|| anyhow!("Field '{}': timestamp {} is out of range", field, millis)),
        Value::Float(millis) if millis.is_finite() => Utc
            .timestamp_millis_opt(millis as i64)
            .single()
            .map(Value::DateTime)
            .ok_or_else(|| anyhow!("Field '{}': timestamp {} is out of range", field, millis)),
        value @ (Value::Null | Value::DateTime(_)) => Ok(value),
        other => Err(anyhow!(
            "Field '{}': can't read {} as a date",
            field,
            other.type_name()
        )),
    }
}

/// Declarative form of the built-in filters, as written in configuration
///
/// ```yaml
/// filters:
///   email: lowercase
///   price: {round_decimals: 2}
///   created_at: datetime
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "FilterRepr")]
pub enum FilterSpec {
    Trim,
    Uppercase,
    Lowercase,
    RoundDecimals(u32),
    Datetime,
}

/// Accepted YAML shapes: a bare name, or a single-key map for parameterized filters
#[derive(Deserialize)]
#[serde(untagged)]
enum FilterRepr {
    Named(NamedFilter),
    RoundDecimals { round_decimals: u32 },
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum NamedFilter {
    Trim,
    Uppercase,
    Lowercase,
    Datetime,
}

impl From<FilterRepr> for FilterSpec {
    fn from(repr: FilterRepr) -> Self {
        match repr {
            FilterRepr::Named(NamedFilter::Trim) => FilterSpec::Trim,
            FilterRepr::Named(NamedFilter::Uppercase) => FilterSpec::Uppercase,
            FilterRepr::Named(NamedFilter::Lowercase) => FilterSpec::Lowercase,
            FilterRepr::Named(NamedFilter::Datetime) => FilterSpec::Datetime,
            FilterRepr::RoundDecimals { round_decimals } => FilterSpec::RoundDecimals(round_decimals),
        }
    }
}

impl FilterSpec {
    pub fn build(self) -> FieldFilter {
        match self {
            FilterSpec::Trim => Arc::new(trim()),
            FilterSpec::Uppercase => Arc::new(uppercase()),
            FilterSpec::Lowercase => Arc::new(lowercase()),
            FilterSpec::RoundDecimals(decimals) => Arc::new(round_decimals(decimals)),
            FilterSpec::Datetime => Arc::new(datetime()),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Trim => write!(f, "trim"),
            FilterSpec::Uppercase => write!(f, "uppercase"),
            FilterSpec::Lowercase => write!(f, "lowercase"),
            FilterSpec::RoundDecimals(decimals) => write!(f, "round_decimals({})", decimals),
            FilterSpec::Datetime => write!(f, "datetime"),
        }
    }
}

/// Run every filter of `table` whose field is present in `record`
pub fn apply_filters(table: &FilterTable, mut record: Record) -> Result<Record> {
    for (field, filter) in table {
        if let Some(value) = record.get_mut(field) {
            let raw = std::mem::replace(value, Value::Null);
            *value = filter(field, raw)?;
        }
    }
    Ok(record)
}
