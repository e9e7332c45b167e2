//! `list` methods.

use crate::builtins::convert::index_arg;
use crate::builtins::functions::sort_values;
use crate::errors::{attribute_error, index_error, value_error, EvalResult};
use crate::interpreter::Interpreter;
use crate::iter::collect;
use crate::native::CallArgs;
use crate::sequence::{normalize_index, slice_indices};
use crate::value::{ListRef, SliceValue, Value};

fn same(a: &Value, b: &Value) -> bool {
    a.is_same(b) || a.py_eq(b)
}

fn clamp_insert(index: i64, len: usize) -> usize {
    let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
    let index = if index < 0 { (index + signed_len).max(0) } else { index.min(signed_len) };
    usize::try_from(index).unwrap_or(0)
}

pub(super) fn call(
    interp: &mut Interpreter<'_>,
    list: &ListRef,
    name: &str,
    mut args: CallArgs,
) -> EvalResult {
    match name {
        "append" => {
            args.arity(name, 1, 1)?;
            list.borrow_mut().push(args.arg(0));
            Ok(Value::None)
        }
        "clear" => {
            args.arity(name, 0, 0)?;
            let drained: Vec<Value> = list.borrow_mut().drain(..).collect();
            drop(drained);
            Ok(Value::None)
        }
        "copy" => {
            args.arity(name, 0, 0)?;
            Ok(Value::list(list.borrow().clone()))
        }
        "count" => {
            args.arity(name, 1, 1)?;
            let item = args.arg(0);
            let n = list.borrow().iter().filter(|v| same(v, &item)).count();
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "extend" => {
            args.arity(name, 1, 1)?;
            let items = collect(&args.arg(0), &interp.limits)?;
            list.borrow_mut().extend(items);
            Ok(Value::None)
        }
        "index" => {
            args.arity(name, 1, 3)?;
            let item = args.arg(0);
            let items = list.borrow();
            let window = SliceValue {
                lower: args.get(1).cloned().unwrap_or(Value::None),
                upper: args.get(2).cloned().unwrap_or(Value::None),
                step: Value::None,
            };
            let (lo, hi, _) = slice_indices(&window, items.len())?;
            let lo = usize::try_from(lo).unwrap_or(0);
            let hi = usize::try_from(hi).unwrap_or(0);
            (lo..hi.min(items.len()))
                .find(|&i| same(&items[i], &item))
                .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .ok_or_else(|| value_error(format!("{} is not in list", item.repr())))
        }
        "insert" => {
            args.arity(name, 2, 2)?;
            let index = index_arg(&args.arg(0))?;
            let mut items = list.borrow_mut();
            let at = clamp_insert(index, items.len());
            items.insert(at, args.arg(1));
            Ok(Value::None)
        }
        "pop" => {
            args.arity(name, 0, 1)?;
            let mut items = list.borrow_mut();
            if items.is_empty() {
                return Err(index_error("pop from empty list"));
            }
            let index = match args.get(0) {
                Some(index) => index_arg(index)?,
                None => -1,
            };
            let at = normalize_index(index, items.len())
                .ok_or_else(|| index_error("pop index out of range"))?;
            Ok(items.remove(at))
        }
        "remove" => {
            args.arity(name, 1, 1)?;
            let item = args.arg(0);
            let mut items = list.borrow_mut();
            let at = items
                .iter()
                .position(|v| same(v, &item))
                .ok_or_else(|| value_error("list.remove(x): x not in list"))?;
            items.remove(at);
            Ok(Value::None)
        }
        "reverse" => {
            args.arity(name, 0, 0)?;
            list.borrow_mut().reverse();
            Ok(Value::None)
        }
        "sort" => {
            let key = args.take_keyword("key").filter(|k| !k.is_none());
            let reverse = args.take_keyword("reverse").is_some_and(|r| r.is_truthy());
            args.no_extra_keywords(name)?;
            args.arity(name, 0, 0)?;
            let items = list.borrow().clone();
            let sorted = sort_values(interp, items, key.as_ref(), reverse)?;
            *list.borrow_mut() = sorted;
            Ok(Value::None)
        }
        other => Err(attribute_error("list", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::clamp_insert;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_positions_clamp_to_the_ends() {
        assert_eq!(clamp_insert(-10, 3), 0);
        assert_eq!(clamp_insert(-1, 3), 2);
        assert_eq!(clamp_insert(10, 3), 3);
    }
}
