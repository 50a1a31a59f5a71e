// schemadrift-core/src/driver/filter.rs
//! Document filter matching for the in-memory driver
//!
//! Supports the subset of the MongoDB query language that count filters
//! use in practice: implicit equality, dot-notation paths, the comparison
//! operators, `$in`/`$nin`, `$exists`, and top-level `$and`/`$or`.
//! Anything else is rejected the way a server rejects a bad predicate.

use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{DriftError, Result};

/// Check whether `document` matches `filter`
///
/// An empty filter matches every document.
///
/// ```
/// use serde_json::json;
/// use schemadrift_core::driver::matches_filter;
///
/// let doc = json!({"age": 30, "address": {"city": "Szeged"}});
/// assert!(matches_filter(&doc, &json!({"age": {"$gte": 18}})).unwrap());
/// assert!(matches_filter(&doc, &json!({"address.city": "Szeged"})).unwrap());
/// ```
pub fn matches_filter(document: &Value, filter: &Value) -> Result<bool> {
    let filter_obj = filter
        .as_object()
        .ok_or_else(|| DriftError::InvalidFilter(format!("filter must be a document: {}", filter)))?;

    for (key, condition) in filter_obj {
        let matched = match key.as_str() {
            "$and" => all_of(document, condition)?,
            "$or" => any_of(document, condition)?,
            op if op.starts_with('$') => {
                return Err(DriftError::InvalidFilter(format!(
                    "unknown top-level operator: {}",
                    op
                )))
            }
            path => matches_condition(get_nested_value(document, path), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn clauses<'a>(op: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .filter(|arr| !arr.is_empty())
        .ok_or_else(|| DriftError::InvalidFilter(format!("{} requires a non-empty array", op)))
}

fn array_operand<'a>(op: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| DriftError::InvalidFilter(format!("{} requires an array", op)))
}

fn all_of(document: &Value, value: &Value) -> Result<bool> {
    for clause in clauses("$and", value)? {
        if !matches_filter(document, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(document: &Value, value: &Value) -> Result<bool> {
    for clause in clauses("$or", value)? {
        if matches_filter(document, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn matches_condition(doc_value: Option<&Value>, condition: &Value) -> Result<bool> {
    let operators = match condition {
        Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj,
        // { field: value } and { field: { sub: doc } } are both plain equality
        _ => return Ok(equals(doc_value, condition)),
    };

    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => equals(doc_value, operand),
            "$ne" => !equals(doc_value, operand),
            "$gt" => compare(doc_value, operand, |o| o == Ordering::Greater),
            "$gte" => compare(doc_value, operand, |o| o != Ordering::Less),
            "$lt" => compare(doc_value, operand, |o| o == Ordering::Less),
            "$lte" => compare(doc_value, operand, |o| o != Ordering::Greater),
            "$in" => array_operand("$in", operand)?
                .iter()
                .any(|candidate| equals(doc_value, candidate)),
            "$nin" => !array_operand("$nin", operand)?
                .iter()
                .any(|candidate| equals(doc_value, candidate)),
            "$exists" => {
                let wanted = operand.as_bool().ok_or_else(|| {
                    DriftError::InvalidFilter("$exists requires a boolean".to_string())
                })?;
                doc_value.is_some() == wanted
            }
            other => {
                return Err(DriftError::InvalidFilter(format!(
                    "unsupported operator: {}",
                    other
                )))
            }
        };
        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Equality with array element matching: `{tags: "a"}` matches `tags: ["a", "b"]`
fn equals(doc_value: Option<&Value>, expected: &Value) -> bool {
    match doc_value {
        None => expected.is_null(),
        Some(v) if v == expected => true,
        Some(Value::Array(arr)) => arr.iter().any(|elem| elem == expected),
        Some(_) => false,
    }
}

fn compare<F>(doc_value: Option<&Value>, operand: &Value, predicate: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match doc_value {
        None => false,
        Some(Value::Array(arr)) => arr
            .iter()
            .any(|elem| compare_values(elem, operand).map(&predicate).unwrap_or(false)),
        Some(v) => compare_values(v, operand).map(predicate).unwrap_or(false),
    }
}

/// Ordering between two values of the same kind; `None` for mixed kinds
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => n1.as_f64()?.partial_cmp(&n2.as_f64()?),
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

/// Dot-notation lookup: `"address.city"`, `"items.0.sku"`
fn get_nested_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut value = doc;
    for part in path.split('.') {
        value = match value {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}
