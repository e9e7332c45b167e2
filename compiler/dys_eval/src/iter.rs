//! Iteration over values.
//!
//! Ranges are walked lazily so a `for` loop over a huge range costs only
//! the iterations it runs (and the node cap stops it). Everything else is
//! snapshotted when the loop starts, so mutating a list inside its own loop
//! cannot run forever.

use crate::accounting::ResourceLimits;
use crate::errors::{not_iterable, resource, EvalResult, ResourceKind};
use crate::value::{RangeValue, Value};

pub enum ValueIter {
    Range { range: RangeValue, next: usize },
    Items(std::vec::IntoIter<Value>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Range { range, next } => {
                if *next >= range.len() {
                    return None;
                }
                let value = range.nth(*next);
                *next += 1;
                Some(Value::Int(value))
            }
            ValueIter::Items(items) => items.next(),
        }
    }
}

/// Start iterating `value`.
pub fn iterate(value: &Value) -> EvalResult<ValueIter> {
    let items = match value {
        Value::Range(range) => {
            return Ok(ValueIter::Range {
                range: *range,
                next: 0,
            })
        }
        Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
        Value::Bytes(b) => b.iter().map(|b| Value::Int(i64::from(*b))).collect(),
        Value::List(items) => items.borrow().clone(),
        Value::Tuple(items) => items.to_vec(),
        Value::Dict(dict) => dict.borrow().keys(),
        Value::Set(set) => set.borrow().to_vec(),
        Value::FrozenSet(set) => set.to_vec(),
        other => return Err(not_iterable(other.type_name())),
    };
    Ok(ValueIter::Items(items.into_iter()))
}

/// Materialize every item of `value`, refusing ranges longer than the
/// scope-size cap.
pub fn collect(value: &Value, limits: &ResourceLimits) -> EvalResult<Vec<Value>> {
    if let Value::Range(range) = value {
        if range.len() > limits.max_scope_size {
            return Err(resource(
                ResourceKind::ValueSize,
                "Sorry, I will not evalute something that long.",
            ));
        }
    }
    Ok(iterate(value)?.collect())
}
