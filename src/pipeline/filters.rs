//! Match stage predicates
//!
//! Predicates are combined with AND semantics. No type coercion: a string
//! never equals a number and ordered comparisons only apply between two
//! numbers or two strings.

use std::cmp::Ordering;

use serde_json::Value;

use crate::record::{compare_values, Record};

/// Comparison operator
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// field = value
    Eq(Value),
    /// field != value (also true when the field is missing or null)
    Ne(Value),
    /// field > value
    Gt(Value),
    /// field >= value
    Gte(Value),
    /// field < value
    Lt(Value),
    /// field <= value
    Lte(Value),
    /// field is present and not null
    Present,
}

/// A single predicate (field path + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field path
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ne(value.into()),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gt(value.into()),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gte(value.into()),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lt(value.into()),
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lte(value.into()),
        }
    }

    pub fn present(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Present,
        }
    }
}

/// Evaluates predicates against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record matches all predicates
    pub fn matches(record: &Record, predicates: &[Predicate]) -> bool {
        predicates
            .iter()
            .all(|pred| Self::matches_predicate(record, pred))
    }

    fn matches_predicate(record: &Record, predicate: &Predicate) -> bool {
        let field_value = match record.lookup(&predicate.field) {
            Some(Value::Null) | None => {
                // Absent values only satisfy an inequality
                return match &predicate.op {
                    FilterOp::Ne(expected) => !expected.is_null(),
                    FilterOp::Eq(expected) => expected.is_null(),
                    _ => false,
                };
            }
            Some(v) => v,
        };

        match &predicate.op {
            FilterOp::Eq(expected) => Self::eq_match(field_value, expected),
            FilterOp::Ne(expected) => !Self::eq_match(field_value, expected),
            FilterOp::Gt(bound) => Self::ordered(field_value, bound, |o| o == Ordering::Greater),
            FilterOp::Gte(bound) => Self::ordered(field_value, bound, |o| o != Ordering::Less),
            FilterOp::Lt(bound) => Self::ordered(field_value, bound, |o| o == Ordering::Less),
            FilterOp::Lte(bound) => Self::ordered(field_value, bound, |o| o != Ordering::Greater),
            FilterOp::Present => true,
        }
    }

    /// Exact equality; integers and floats with the same value are equal
    fn eq_match(actual: &Value, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::Number(_), Value::Number(_)) => {
                compare_values(Some(actual), Some(expected)) == Ordering::Equal
            }
            _ => actual == expected,
        }
    }

    fn ordered(actual: &Value, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        match (actual, bound) {
            (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
                accept(compare_values(Some(actual), Some(bound)))
            }
            _ => false,
        }
    }
}
