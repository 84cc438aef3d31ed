//! Descriptor-driven validation, casting and defaulting of entity attributes

use super::descriptor::{FieldDescriptor, FieldKind, FieldType, Schema};
use crate::core::error::{EntityValidationError, FieldPath, ValidationFailure};
use crate::core::value::{Record, Value};
use chrono::{DateTime, Utc};

/// Validates records against a top-level attribute schema
///
/// For each described attribute, in order:
/// 1. substitute `default` when the value is absent or null
/// 2. fail if still absent and `required`, otherwise omit it
/// 3. check (and cast) the value against the descriptor type
/// 4. check `enum` membership
/// 5. recurse into object attributes
/// 6. recurse into array elements
///
/// Attributes that are not described pass through untouched.
///
/// # Example
/// ```rust,ignore
/// let validator = SchemaValidator::new(schema);
/// let entity = validator.apply(&record)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    attributes: Schema,
}

impl SchemaValidator {
    pub fn new(attributes: Schema) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &Schema {
        &self.attributes
    }

    /// Validate a whole record, returning the cast and defaulted copy
    pub fn apply(&self, record: &Record) -> Result<Record, EntityValidationError> {
        check_object(record, &self.attributes, false, &FieldPath::root())
    }

    /// Validate the single attribute reached by `path`
    ///
    /// Each segment but the last must name an object attribute. Returns the
    /// checked value, `None` when it is absent and optional. Paths that
    /// leave the schema return the raw value unchecked. An empty path
    /// validates the whole record.
    pub fn apply_field(
        &self,
        record: &Record,
        path: &[&str],
    ) -> Result<Option<Value>, EntityValidationError> {
        let Some((first, rest)) = path.split_first() else {
            return self.apply(record).map(|checked| Some(Value::Object(checked)));
        };

        let mut field_path = FieldPath::root().key(first);
        let mut value = record.get(*first);
        let mut descriptor = self.attributes.get(*first);

        for segment in rest {
            field_path = field_path.key(segment);
            value = value.and_then(Value::as_object).and_then(|map| map.get(*segment));
            descriptor = descriptor.and_then(|d| match &d.kind {
                FieldKind::Object { attributes, .. } => attributes.get(*segment),
                _ => None,
            });
        }

        match descriptor {
            Some(descriptor) => check_value(value, descriptor, &field_path),
            None => Ok(value.cloned()),
        }
    }
}

fn check_object(
    object: &Record,
    attributes: &Schema,
    strict: bool,
    path: &FieldPath,
) -> Result<Record, EntityValidationError> {
    if strict {
        if let Some(unknown) = object.keys().find(|key| !attributes.contains_key(*key)) {
            return Err(EntityValidationError::new(
                path.key(unknown),
                ValidationFailure::UnknownAttribute,
            ));
        }
    }

    let mut output = object.clone();
    for (name, descriptor) in attributes {
        match check_value(object.get(name), descriptor, &path.key(name))? {
            Some(value) => {
                output.insert(name.clone(), value);
            }
            None => {
                output.shift_remove(name);
            }
        }
    }
    Ok(output)
}

fn check_value(
    value: Option<&Value>,
    descriptor: &FieldDescriptor,
    path: &FieldPath,
) -> Result<Option<Value>, EntityValidationError> {
    let fail = |failure| EntityValidationError::new(path.clone(), failure);

    let value = match (value.filter(|v| !v.is_null()), &descriptor.default) {
        (Some(value), _) => value.clone(),
        (None, Some(default)) => default.clone(),
        (None, None) if descriptor.required => return Err(fail(ValidationFailure::MissingRequired)),
        (None, None) => return Ok(None),
    };

    let value = cast(value, descriptor.field_type()).map_err(|rejected| {
        fail(ValidationFailure::TypeMismatch {
            expected: descriptor.field_type(),
            actual: rejected.to_string(),
        })
    })?;

    if let Some(members) = &descriptor.enum_members {
        if !members.iter().any(|member| member.accepts(&value)) {
            return Err(fail(ValidationFailure::EnumViolation {
                value: value.to_string(),
            }));
        }
    }

    let value = match (&descriptor.kind, value) {
        (FieldKind::Object { attributes, strict }, Value::Object(map)) => {
            Value::Object(check_object(&map, attributes, *strict, path)?)
        }
        (FieldKind::Array { of: Some(spec) }, Value::Array(items)) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    check_element(item, spec.descriptor_for(index), &path.index(index))
                })
                .collect::<Result<_, _>>()?,
        ),
        (_, value) => value,
    };

    Ok(Some(value))
}

/// Elements keep their position: an absent optional element stays null
fn check_element(
    item: &Value,
    descriptor: Option<&FieldDescriptor>,
    path: &FieldPath,
) -> Result<Value, EntityValidationError> {
    match descriptor {
        Some(descriptor) => {
            check_value(Some(item), descriptor, path).map(|checked| checked.unwrap_or(Value::Null))
        }
        None => Ok(item.clone()),
    }
}

/// Cast `value` into `expected`, handing it back unchanged on mismatch
fn cast(value: Value, expected: FieldType) -> Result<Value, Value> {
    match (expected, value) {
        (FieldType::Any, value) => Ok(value),
        (FieldType::String, value @ Value::String(_)) => Ok(value),
        (FieldType::Integer, value @ Value::Integer(_)) => Ok(value),
        (FieldType::Integer, Value::Float(f))
            if f.is_finite()
                && f.fract() == 0.0
                && f >= i64::MIN as f64
                && f <= i64::MAX as f64 =>
        {
            Ok(Value::Integer(f as i64))
        }
        (FieldType::Float, value @ Value::Float(_)) => Ok(value),
        (FieldType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (FieldType::DateTime, value @ Value::DateTime(_)) => Ok(value),
        (FieldType::DateTime, Value::String(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(date) => Ok(Value::DateTime(date.with_timezone(&Utc))),
            Err(_) => Err(Value::String(s)),
        },
        (FieldType::Object, value @ (Value::Object(_) | Value::Array(_) | Value::DateTime(_))) => {
            Ok(value)
        }
        (FieldType::Array, value @ Value::Array(_)) => Ok(value),
        (_, value) => Err(value),
    }
}
