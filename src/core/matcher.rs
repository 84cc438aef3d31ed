//! In-memory predicate evaluation of canonical queries

use crate::core::operator::Operator;
use crate::core::query::{FieldCondition, Query};
use crate::core::value::{Record, Value, deep_equal};
use std::cmp::Ordering;

/// Check whether `record` satisfies every condition of `query`
///
/// Fields absent from the record behave as undefined. An empty query
/// matches every record. There is no OR: callers compose it themselves.
pub fn matches(record: &Record, query: &Query) -> bool {
    query
        .iter()
        .all(|(field, condition)| matches_condition(record.get(field), condition))
}

/// Check a single field value against its canonical condition
pub fn matches_condition(value: Option<&Value>, condition: &FieldCondition) -> bool {
    condition
        .iter()
        .all(|(operator, operand)| apply_operator(*operator, value, operand))
}

fn apply_operator(operator: Operator, value: Option<&Value>, operand: &Value) -> bool {
    match operator {
        Operator::Exists => value.is_some() == operand.is_truthy(),
        Operator::Equal => value.is_some_and(|v| deep_equal(v, operand)),
        Operator::Diff => value.is_some_and(|v| !deep_equal(v, operand)),
        Operator::Less => ordering(value, operand, |o| o == Ordering::Less),
        Operator::LessEqual => ordering(value, operand, |o| o != Ordering::Greater),
        Operator::Greater => ordering(value, operand, |o| o == Ordering::Greater),
        Operator::GreaterEqual => ordering(value, operand, |o| o != Ordering::Less),
        Operator::Contains => value
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().any(|item| deep_equal(item, operand))),
    }
}

fn ordering(value: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    value
        .and_then(|v| v.compare(operand))
        .is_some_and(accept)
}
