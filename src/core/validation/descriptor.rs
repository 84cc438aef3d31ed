//! Field descriptors: the declarative attribute schema of an entity
//!
//! Descriptors deserialize from YAML or JSON:
//!
//! ```yaml
//! name:
//!   type: string
//!   required: true
//!   enum: [{pattern: "^[A-Z]"}, "anonymous"]
//! tags:
//!   type: array
//!   of: {type: string}
//! address:
//!   type: object
//!   strict: true
//!   attributes:
//!     city: {type: string, default: "Paris"}
//! ```

use crate::core::error::ConfigError;
use crate::core::value::{Value, deep_equal};
use indexmap::IndexMap;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Attribute name → descriptor
pub type Schema = IndexMap<String, FieldDescriptor>;

/// Run-time category an attribute must belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Any,
    String,
    Integer,
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    Object,
    Array,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Any => "any",
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::DateTime => "datetime",
            FieldType::Object => "object",
            FieldType::Array => "array",
        };
        f.write_str(name)
    }
}

/// The type of a field together with its type-specific settings
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Any,
    String,
    Integer,
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    Object {
        /// Nested attribute descriptors
        #[serde(default)]
        attributes: Schema,
        /// Reject keys that are not described in `attributes`
        #[serde(default)]
        strict: bool,
    },
    Array {
        /// Element descriptors; `None` leaves elements unchecked
        #[serde(default)]
        of: Option<ElementSpec>,
    },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Any => FieldType::Any,
            FieldKind::String => FieldType::String,
            FieldKind::Integer => FieldType::Integer,
            FieldKind::Float => FieldType::Float,
            FieldKind::DateTime => FieldType::DateTime,
            FieldKind::Object { .. } => FieldType::Object,
            FieldKind::Array { .. } => FieldType::Array,
        }
    }
}

/// Descriptors applied to array elements
///
/// A single descriptor applies to every element. A list applies
/// positionally; once exhausted, its last descriptor applies to every
/// remaining element.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ElementSpec {
    Positional(Vec<FieldDescriptor>),
    Single(Box<FieldDescriptor>),
}

impl ElementSpec {
    /// Descriptor governing the element at `index`
    pub fn descriptor_for(&self, index: usize) -> Option<&FieldDescriptor> {
        match self {
            ElementSpec::Single(descriptor) => Some(descriptor),
            ElementSpec::Positional(list) => list.get(index).or_else(|| list.last()),
        }
    }
}

/// A member of an `enum` constraint
///
/// In YAML/JSON a pattern is written `{pattern: "<regex>"}`; anything else
/// is a literal.
#[derive(Debug, Clone)]
pub enum EnumMember {
    /// Accepts values deep-equal to this one
    Literal(Value),
    /// Accepts strings matching this expression
    Pattern(Regex),
}

impl EnumMember {
    pub fn literal(value: impl Into<Value>) -> Self {
        EnumMember::Literal(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(EnumMember::Pattern)
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            EnumMember::Literal(literal) => deep_equal(literal, value),
            EnumMember::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
        }
    }
}

impl<'de> Deserialize<'de> for EnumMember {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let pattern = match &value {
            Value::Object(map) if map.len() == 1 => map.get("pattern").and_then(Value::as_str),
            _ => None,
        };
        match pattern {
            Some(pattern) => Regex::new(pattern)
                .map(EnumMember::Pattern)
                .map_err(D::Error::custom),
            None => Ok(EnumMember::Literal(value)),
        }
    }
}

/// Schema node describing one attribute
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Absent or null values are rejected
    #[serde(default)]
    pub required: bool,

    /// Substituted when the value is absent or null
    #[serde(default)]
    pub default: Option<Value>,

    /// Accepted literal values and/or string patterns
    #[serde(default, rename = "enum")]
    pub enum_members: Option<Vec<EnumMember>>,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            enum_members: None,
        }
    }

    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    pub fn object(attributes: Schema) -> Self {
        Self::new(FieldKind::Object {
            attributes,
            strict: false,
        })
    }

    /// Array whose elements all follow `element`
    pub fn array_of(element: FieldDescriptor) -> Self {
        Self::new(FieldKind::Array {
            of: Some(ElementSpec::Single(Box::new(element))),
        })
    }

    /// Array whose elements follow `elements` positionally
    pub fn array_of_each(elements: Vec<FieldDescriptor>) -> Self {
        Self::new(FieldKind::Array {
            of: Some(ElementSpec::Positional(elements)),
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum(mut self, members: Vec<EnumMember>) -> Self {
        self.enum_members = Some(members);
        self
    }

    /// Reject unknown keys; only meaningful on object descriptors
    pub fn strict(mut self) -> Self {
        if let FieldKind::Object { strict, .. } = &mut self.kind {
            *strict = true;
        }
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }
}
