//! Indexing and slicing of sequences and mappings.

use std::rc::Rc;

use crate::errors::{index_error, key_error, type_error, value_error, EvalError, EvalResult};
use crate::value::{RangeValue, SliceValue, Value};

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

fn slice_bound(value: &Value) -> EvalResult<Option<i64>> {
    match value {
        Value::None => Ok(None),
        other => other.as_int().map(Some).ok_or_else(|| {
            type_error("slice indices must be integers or None or have an __index__ method")
        }),
    }
}

/// `(start, stop, step)` of `slice` over a sequence of `len` items, with
/// bounds clamped the way Python clamps them.
pub fn slice_indices(slice: &SliceValue, len: usize) -> EvalResult<(i64, i64, i64)> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let step = slice_bound(&slice.step)?.unwrap_or(1);
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let (lower_default, upper_default) = if step < 0 { (len - 1, -1) } else { (0, len) };
    let clamp = |bound: Option<i64>, default: i64| match bound {
        None => default,
        Some(i) if i < 0 => {
            let i = i + len;
            if i < 0 {
                if step < 0 {
                    -1
                } else {
                    0
                }
            } else {
                i
            }
        }
        Some(i) if i >= len => {
            if step < 0 {
                len - 1
            } else {
                len
            }
        }
        Some(i) => i,
    };
    let start = clamp(slice_bound(&slice.lower)?, lower_default);
    let stop = clamp(slice_bound(&slice.upper)?, upper_default);
    Ok((start, stop, step))
}

/// Positions selected by a slice.
pub fn slice_positions(slice: &SliceValue, len: usize) -> EvalResult<Vec<usize>> {
    let (start, stop, step) = slice_indices(slice, len)?;
    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(position) = usize::try_from(i) {
            positions.push(position);
        }
        i += step;
    }
    Ok(positions)
}

fn pick<T: Clone>(items: &[T], slice: &SliceValue) -> EvalResult<Vec<T>> {
    Ok(slice_positions(slice, items.len())?
        .into_iter()
        .filter_map(|i| items.get(i).cloned())
        .collect())
}

fn index_of(key: &Value, container: &Value) -> EvalResult<i64> {
    key.as_int().ok_or_else(|| {
        type_error(format!(
            "{} indices must be integers or slices, not {}",
            container.type_name(),
            key.type_name()
        ))
    })
}

/// `container[key]`.
pub fn get_item(container: &Value, key: &Value) -> EvalResult {
    match (container, key) {
        (Value::Dict(dict), _) => dict
            .borrow()
            .get(key)?
            .ok_or_else(|| key_error(key.clone())),
        (Value::List(items), Value::Slice(slice)) => Ok(Value::list(pick(&items.borrow(), slice)?)),
        (Value::Tuple(items), Value::Slice(slice)) => Ok(Value::tuple(pick(items, slice)?)),
        (Value::Str(s), Value::Slice(slice)) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::string(pick(&chars, slice)?.into_iter().collect()))
        }
        (Value::Bytes(b), Value::Slice(slice)) => Ok(Value::Bytes(Rc::from(pick(b, slice)?))),
        (Value::Range(range), Value::Slice(slice)) => {
            let (start, stop, step) = slice_indices(slice, range.len())?;
            let at = |i: i64| range.start.saturating_add(i.saturating_mul(range.step));
            Ok(Value::Range(RangeValue {
                start: at(start),
                stop: at(stop),
                step: range.step.saturating_mul(step),
            }))
        }
        (Value::List(items), _) => {
            let items = items.borrow();
            let i = normalize_index(index_of(key, container)?, items.len())
                .ok_or_else(|| index_error("list index out of range"))?;
            Ok(items[i].clone())
        }
        (Value::Tuple(items), _) => {
            let i = normalize_index(index_of(key, container)?, items.len())
                .ok_or_else(|| index_error("tuple index out of range"))?;
            Ok(items[i].clone())
        }
        (Value::Str(s), _) => {
            let index = index_of(key, container)?;
            let len = s.chars().count();
            normalize_index(index, len)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| index_error("string index out of range"))
        }
        (Value::Bytes(b), _) => {
            let i = normalize_index(index_of(key, container)?, b.len())
                .ok_or_else(|| index_error("index out of range"))?;
            Ok(Value::Int(i64::from(b[i])))
        }
        (Value::Range(range), _) => {
            let i = normalize_index(index_of(key, container)?, range.len())
                .ok_or_else(|| index_error("range object index out of range"))?;
            Ok(Value::Int(range.nth(i)))
        }
        // `list[int]` and `Optional[str]` annotations evaluate to their origin.
        (Value::Type(_), _) => Ok(container.clone()),
        (Value::Native(f), _) if &*f.id.owner == "typing" => Ok(container.clone()),
        _ => Err(type_error(format!(
            "'{}' object is not subscriptable",
            container.type_name()
        ))),
    }
}

/// `container[key] = value`.
pub fn set_item(container: &Value, key: &Value, value: Value) -> Result<(), EvalError> {
    match (container, key) {
        (Value::Dict(dict), _) => dict.borrow_mut().insert(key.clone(), value),
        (Value::List(items), Value::Slice(slice)) => {
            let replacement = crate::iter::iterate(&value)
                .map_err(|_| type_error("can only assign an iterable"))?
                .collect::<Vec<_>>();
            let mut items = items.borrow_mut();
            let (start, stop, step) = slice_indices(slice, items.len())?;
            if step == 1 {
                let start = usize::try_from(start).unwrap_or(0);
                let stop = usize::try_from(stop).unwrap_or(0).max(start);
                items.splice(start..stop, replacement);
                return Ok(());
            }
            let positions = slice_positions(slice, items.len())?;
            if positions.len() != replacement.len() {
                return Err(value_error(format!(
                    "attempt to assign sequence of size {} to extended slice of size {}",
                    replacement.len(),
                    positions.len()
                )));
            }
            for (position, item) in positions.into_iter().zip(replacement) {
                items[position] = item;
            }
            Ok(())
        }
        (Value::List(items), _) => {
            let mut items = items.borrow_mut();
            let i = normalize_index(index_of(key, container)?, items.len())
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items[i] = value;
            Ok(())
        }
        _ => Err(type_error(format!(
            "'{}' object does not support item assignment",
            container.type_name()
        ))),
    }
}

/// `del container[key]`.
pub fn del_item(container: &Value, key: &Value) -> Result<(), EvalError> {
    match (container, key) {
        (Value::Dict(dict), _) => match dict.borrow_mut().remove(key)? {
            Some(_) => Ok(()),
            None => Err(key_error(key.clone())),
        },
        (Value::List(items), Value::Slice(slice)) => {
            let mut items = items.borrow_mut();
            let mut positions = slice_positions(slice, items.len())?;
            positions.sort_unstable();
            for position in positions.into_iter().rev() {
                items.remove(position);
            }
            Ok(())
        }
        (Value::List(items), _) => {
            let mut items = items.borrow_mut();
            let i = normalize_index(index_of(key, container)?, items.len())
                .ok_or_else(|| index_error("list assignment index out of range"))?;
            items.remove(i);
            Ok(())
        }
        _ => Err(type_error(format!(
            "'{}' object doesn't support item deletion",
            container.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slice(lower: Value, upper: Value, step: Value) -> SliceValue {
        SliceValue { lower, upper, step }
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn slice_bounds_are_clamped() {
        let s = slice(Value::Int(-100), Value::Int(100), Value::None);
        assert_eq!(slice_indices(&s, 5).ok(), Some((0, 5, 1)));
        let reversed = slice(Value::None, Value::None, Value::Int(-1));
        assert_eq!(slice_positions(&reversed, 3).ok(), Some(vec![2, 1, 0]));
    }

    #[test]
    fn zero_step_is_rejected() {
        let s = slice(Value::None, Value::None, Value::Int(0));
        assert!(slice_indices(&s, 3).is_err());
    }

    #[test]
    fn string_slices_work_on_characters() {
        let s = Value::str("héllo");
        let key = Value::Slice(Rc::new(slice(Value::Int(1), Value::Int(3), Value::None)));
        assert_eq!(get_item(&s, &key).ok().map(|v| v.to_str()), Some("él".to_string()));
    }

    #[test]
    fn list_slice_assignment_replaces_a_run() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let key = Value::Slice(Rc::new(slice(Value::Int(0), Value::Int(2), Value::None)));
        assert!(set_item(&list, &key, Value::list(vec![Value::Int(9)])).is_ok());
        assert_eq!(list.repr(), "[9, 3]");
    }

    #[test]
    fn extended_slice_assignment_checks_the_size() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let key = Value::Slice(Rc::new(slice(Value::None, Value::None, Value::Int(2))));
        let err = set_item(&list, &key, Value::list(vec![Value::Int(9)]));
        assert!(err.is_err_and(|e| e.message().contains("extended slice of size 2")));
    }

    #[test]
    fn missing_dict_key_raises_key_error() {
        let dict = Value::dict(crate::value::Dict::new());
        let err = get_item(&dict, &Value::str("k"));
        assert!(err.is_err_and(|e| e.class_name().as_ref() == "KeyError"));
    }
}
