//! Query language and options normalization
//!
//! Application code writes queries with shorthands (`{"age": {">=": 18}}`,
//! `{"name": "foo"}`) and loosely typed options (`{"limit": "10"}`). Before
//! reaching an adapter, both are turned into their canonical forms:
//!
//! ```text
//! RawQuery   {"a": 3, "b": {">": 1}, "c": <undefined>}
//!     └─▶ Query {"a": {"$equal": 3}, "b": {"$greater": 1}, "c": {"$exists": false}}
//!
//! RawQueryOptions {"page": 2, "limit": "10"}
//!     └─▶ QueryOptions {skip: 20, limit: Some(10), remap_input: true, remap_output: true}
//! ```

use crate::core::error::QueryError;
use crate::core::operator::Operator;
use crate::core::value::{Record, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Raw & canonical queries
// =============================================================================

/// A query as written by application code
///
/// Each field maps to either `None` (undefined, meaning "must not exist"),
/// a bare value (shorthand for `$equal`), or a condition object whose keys
/// are canonical operators or their aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery(IndexMap<String, Option<Value>>);

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field condition or a bare value
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), Some(value.into()));
        self
    }

    /// Add a field whose value is undefined
    pub fn with_undefined(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into(), None);
        self
    }

    /// Build a raw query from a JSON object
    pub fn from_json(value: serde_json::Value) -> Result<Self, QueryError> {
        match Value::from(value) {
            Value::Object(map) => Ok(Self::from(map)),
            other => Err(QueryError::TypeMismatch {
                subject: "query".to_string(),
                expected: "an object",
                value: other.to_string(),
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<Option<&Value>> {
        self.0.get(field).map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, Option<&Value>)> {
        self.0.iter().map(|(field, value)| (field, value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Record> for RawQuery {
    fn from(record: Record) -> Self {
        Self(
            record
                .into_iter()
                .map(|(field, value)| (field, Some(value)))
                .collect(),
        )
    }
}

impl FromIterator<(String, Option<Value>)> for RawQuery {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Canonical condition on a single field: every key is a full operator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldCondition(IndexMap<Operator, Value>);

impl FieldCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, operator: Operator, operand: impl Into<Value>) -> Self {
        self.0.insert(operator, operand.into());
        self
    }

    pub fn insert(&mut self, operator: Operator, operand: Value) {
        self.0.insert(operator, operand);
    }

    pub fn get(&self, operator: Operator) -> Option<&Value> {
        self.0.get(&operator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Operator, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Operator, Value)> for FieldCondition {
    fn from_iter<I: IntoIterator<Item = (Operator, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&FieldCondition> for Value {
    fn from(condition: &FieldCondition) -> Self {
        Value::Object(
            condition
                .iter()
                .map(|(op, operand)| (op.canonical_name().to_string(), operand.clone()))
                .collect(),
        )
    }
}

/// A canonical query: field name → canonical condition
///
/// Conditions of all fields are combined with a logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query(IndexMap<String, FieldCondition>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, condition: FieldCondition) -> Self {
        self.0.insert(field.into(), condition);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldCondition> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldCondition)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rename every field through `rename`, keeping conditions untouched
    pub fn map_fields(self, rename: impl Fn(&str) -> String) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(field, condition)| (rename(&field), condition))
                .collect(),
        )
    }
}

impl FromIterator<(String, FieldCondition)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, FieldCondition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&Query> for RawQuery {
    fn from(query: &Query) -> Self {
        query
            .iter()
            .map(|(field, condition)| (field.clone(), Some(Value::from(condition))))
            .collect()
    }
}

// =============================================================================
// Options
// =============================================================================

/// Options as written by application code
///
/// Every option is optional and loosely typed: numeric options accept
/// numbers or numeric strings (including `"Infinity"`). A `null` option is
/// treated as absent.
///
/// # Example
/// ```rust,ignore
/// let raw: RawQueryOptions = serde_json::from_value(json!({"page": 2, "limit": "10"}))?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawQueryOptions {
    /// Number of matching records to skip
    pub skip: Option<Value>,
    /// Maximum number of records to touch
    pub limit: Option<Value>,
    /// Page number (starts at 0), desugars to `skip = page * limit`
    pub page: Option<Value>,
    /// Canonicalize and remap the query before use
    pub remap_input: Option<Value>,
    /// Remap records read back from the store
    pub remap_output: Option<Value>,
}

impl RawQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip(mut self, skip: impl Into<Value>) -> Self {
        self.skip = Some(skip.into());
        self
    }

    pub fn with_limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<Value>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_remap_input(mut self, remap: impl Into<Value>) -> Self {
        self.remap_input = Some(remap.into());
        self
    }

    pub fn with_remap_output(mut self, remap: impl Into<Value>) -> Self {
        self.remap_output = Some(remap.into());
        self
    }
}

/// Canonical options consumed by adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub skip: usize,
    /// `None` means unbounded
    pub limit: Option<usize>,
    pub remap_input: bool,
    pub remap_output: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: None,
            remap_input: true,
            remap_output: true,
        }
    }
}

impl QueryOptions {
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `count` records already satisfy the limit
    pub fn limit_reached(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| count >= limit)
    }
}

fn present(option: &Option<Value>) -> Option<&Value> {
    option.as_ref().filter(|value| !value.is_null())
}

fn expect_bool(option: &'static str, value: &Value) -> Result<bool, QueryError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(QueryError::TypeMismatch {
            subject: option.to_string(),
            expected: "a boolean",
            value: other.to_string(),
        }),
    }
}

/// Coerce a numeric-looking value; infinities pass, fractions don't
fn expect_integer(option: &'static str, value: &Value) -> Result<f64, QueryError> {
    let type_error = || QueryError::TypeMismatch {
        subject: option.to_string(),
        expected: "an integer",
        value: value.to_string(),
    };
    let number = match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| type_error())?,
        _ => return Err(type_error()),
    };
    if number.is_nan() || (number.is_finite() && number.fract() != 0.0) {
        return Err(type_error());
    }
    Ok(number)
}

/// Transform raw options into their canonical form
///
/// Must be applied before calling adapter methods.
///
/// # Errors
/// - [`QueryError::TypeMismatch`] for non-integer numeric options or non-boolean flags
/// - [`QueryError::Range`] for negative/infinite `skip`, non-positive `limit`,
///   negative/infinite `page`, or `page` with an unbounded `limit`
/// - [`QueryError::MissingOption`] for `page` without `limit`
/// - [`QueryError::IncompatibleOptions`] for `page` together with `skip`
pub fn normalize_options(raw: &RawQueryOptions) -> Result<QueryOptions, QueryError> {
    let mut options = QueryOptions::default();

    if let Some(value) = present(&raw.remap_input) {
        options.remap_input = expect_bool("remapInput", value)?;
    }
    if let Some(value) = present(&raw.remap_output) {
        options.remap_output = expect_bool("remapOutput", value)?;
    }

    if let Some(value) = present(&raw.limit) {
        let limit = expect_integer("limit", value)?;
        if limit <= 0.0 {
            return Err(QueryError::Range {
                option: "limit",
                value: value.to_string(),
                reason: "must be strictly positive",
            });
        }
        options.limit = limit.is_finite().then_some(limit as usize);
    }

    if let Some(value) = present(&raw.skip) {
        let skip = expect_integer("skip", value)?;
        if !skip.is_finite() || skip < 0.0 {
            return Err(QueryError::Range {
                option: "skip",
                value: value.to_string(),
                reason: "must be a finite, positive or zero integer",
            });
        }
        options.skip = skip as usize;
    }

    if let Some(value) = present(&raw.page) {
        if present(&raw.limit).is_none() {
            return Err(QueryError::MissingOption {
                option: "page",
                requires: "limit",
            });
        }
        if present(&raw.skip).is_some() {
            return Err(QueryError::IncompatibleOptions {
                option: "page",
                conflicts_with: "skip",
            });
        }
        let page = expect_integer("page", value)?;
        if !page.is_finite() || page < 0.0 {
            return Err(QueryError::Range {
                option: "page",
                value: value.to_string(),
                reason: "must be a finite, positive or zero integer",
            });
        }
        let limit = options.limit.ok_or(QueryError::Range {
            option: "page",
            value: value.to_string(),
            reason: "requires a finite limit",
        })?;
        options.skip = (page as usize)
            .checked_mul(limit)
            .ok_or(QueryError::Range {
                option: "page",
                value: value.to_string(),
                reason: "page * limit overflows",
            })?;
    }

    Ok(options)
}

/// Transform a raw query into its canonical form
///
/// When `options.remap_input` is false the caller is trusted to already use
/// canonical conditions: fields are copied as is, without alias rewriting or
/// operand checks.
pub fn normalize_query(raw: &RawQuery, options: &QueryOptions) -> Result<Query, QueryError> {
    if !options.remap_input {
        return copy_canonical(raw);
    }

    raw.iter()
        .map(|(field, value)| {
            let condition = match value {
                None => FieldCondition::new().with(Operator::Exists, false),
                Some(Value::Object(search)) => normalize_field_condition(field, search)?,
                Some(other) => FieldCondition::new().with(Operator::Equal, other.clone()),
            };
            Ok((field.clone(), condition))
        })
        .collect()
}

/// Replace aliases by canonical operators and check ordering operands
///
/// Every alias/canonical conflict is reported before any operand is
/// looked at.
fn normalize_field_condition(field: &str, search: &Record) -> Result<FieldCondition, QueryError> {
    for op in Operator::ALL {
        if let Some(alias) = op.alias() {
            if search.contains_key(alias) && search.contains_key(op.canonical_name()) {
                return Err(QueryError::FormatConflict {
                    alias,
                    canonical: op.canonical_name(),
                });
            }
        }
    }

    let mut condition = FieldCondition::new();
    for (key, operand) in search {
        let operator = Operator::from_alias(key)
            .or_else(|| Operator::from_canonical(key))
            .ok_or_else(|| QueryError::UnknownOperator {
                field: field.to_string(),
                key: key.clone(),
            })?;

        if operator.is_ordering() && !(operand.is_number() || operand.as_datetime().is_some()) {
            return Err(QueryError::TypeMismatch {
                subject: format!("{}.{}", field, operator),
                expected: "a numeric or date value",
                value: operand.to_string(),
            });
        }

        condition.insert(operator, operand.clone());
    }

    Ok(condition)
}

fn copy_canonical(raw: &RawQuery) -> Result<Query, QueryError> {
    raw.iter()
        .map(|(field, value)| {
            let Some(Value::Object(search)) = value else {
                return Err(QueryError::TypeMismatch {
                    subject: field.clone(),
                    expected: "a canonical condition object",
                    value: value.map_or_else(|| "undefined".to_string(), Value::to_string),
                });
            };
            let condition = search
                .iter()
                .map(|(key, operand)| {
                    Operator::from_canonical(key)
                        .map(|op| (op, operand.clone()))
                        .ok_or_else(|| QueryError::UnknownOperator {
                            field: field.clone(),
                            key: key.clone(),
                        })
                })
                .collect::<Result<FieldCondition, _>>()?;
            Ok((field.clone(), condition))
        })
        .collect()
}
