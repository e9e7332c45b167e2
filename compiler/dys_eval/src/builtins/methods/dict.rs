//! `dict` methods. `keys`, `values` and `items` return lists.

use crate::builtins::convert::mapping_pairs;
use crate::errors::{attribute_error, key_error, EvalResult};
use crate::interpreter::Interpreter;
use crate::iter::iterate;
use crate::native::CallArgs;
use crate::value::{Dict, DictRef, Value};

/// `dict.fromkeys(iterable, value=None)`.
pub(super) fn fromkeys(args: CallArgs) -> EvalResult {
    args.arity("fromkeys", 1, 2)?;
    let value = args.get(1).cloned().unwrap_or(Value::None);
    let mut dict = Dict::new();
    for key in iterate(&args.arg(0))? {
        dict.insert(key, value.clone())?;
    }
    Ok(Value::dict(dict))
}

fn update(interp: &Interpreter<'_>, dict: &DictRef, args: CallArgs) -> EvalResult<()> {
    args.positional_arity("update", 0, 1)?;
    let pairs = match args.get(0) {
        Some(source) => mapping_pairs(source, &interp.limits)?,
        None => Vec::new(),
    };
    let mut dict = dict.borrow_mut();
    for (key, value) in pairs {
        dict.insert(key, value)?;
    }
    for (key, value) in args.keywords {
        dict.insert_str(&key, value);
    }
    Ok(())
}

pub(super) fn call(
    interp: &mut Interpreter<'_>,
    dict: &DictRef,
    name: &str,
    args: CallArgs,
) -> EvalResult {
    match name {
        "clear" => {
            args.arity(name, 0, 0)?;
            dict.borrow_mut().clear();
            Ok(Value::None)
        }
        "copy" => {
            args.arity(name, 0, 0)?;
            Ok(Value::dict(dict.borrow().clone()))
        }
        "fromkeys" => fromkeys(args),
        "get" => {
            args.arity(name, 1, 2)?;
            let found = dict.borrow().get(&args.arg(0))?;
            Ok(found.unwrap_or_else(|| args.arg(1)))
        }
        "items" => {
            args.arity(name, 0, 0)?;
            let items = dict
                .borrow()
                .iter()
                .map(|(k, v)| Value::tuple(vec![k.clone(), v.clone()]))
                .collect();
            Ok(Value::list(items))
        }
        "keys" => {
            args.arity(name, 0, 0)?;
            Ok(Value::list(dict.borrow().keys()))
        }
        "values" => {
            args.arity(name, 0, 0)?;
            Ok(Value::list(dict.borrow().values()))
        }
        "pop" => {
            args.arity(name, 1, 2)?;
            let key = args.arg(0);
            match dict.borrow_mut().remove(&key)? {
                Some(value) => Ok(value),
                None => args.get(1).cloned().ok_or_else(|| key_error(key)),
            }
        }
        "popitem" => {
            args.arity(name, 0, 0)?;
            dict.borrow_mut()
                .pop_last()
                .map(|(k, v)| Value::tuple(vec![k, v]))
                .ok_or_else(|| key_error(Value::str("popitem(): dictionary is empty")))
        }
        "setdefault" => {
            args.arity(name, 1, 2)?;
            let key = args.arg(0);
            let existing = dict.borrow().get(&key)?;
            match existing {
                Some(value) => Ok(value),
                None => {
                    let value = args.arg(1);
                    dict.borrow_mut().insert(key, value.clone())?;
                    Ok(value)
                }
            }
        }
        "update" => {
            update(interp, dict, args)?;
            Ok(Value::None)
        }
        other => Err(attribute_error("dict", other)),
    }
}
