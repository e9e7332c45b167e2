//! `set` and `frozenset` methods. Binary operations return the receiver's
//! own kind.

use std::rc::Rc;

use crate::errors::{attribute_error, key_error, EvalResult};
use crate::interpreter::Interpreter;
use crate::iter::collect;
use crate::native::CallArgs;
use crate::value::{with_set, Value, ValueSet};

fn snapshot(receiver: &Value) -> ValueSet {
    with_set(receiver, ValueSet::clone)
}

fn rewrap(receiver: &Value, set: ValueSet) -> Value {
    match receiver {
        Value::FrozenSet(_) => Value::FrozenSet(Rc::new(set)),
        _ => Value::set(set),
    }
}

/// Any iterable as a set; sets are copied without rehashing.
fn as_set(interp: &Interpreter<'_>, value: &Value) -> EvalResult<ValueSet> {
    match value {
        Value::Set(_) | Value::FrozenSet(_) => Ok(snapshot(value)),
        other => ValueSet::from_values(collect(other, &interp.limits)?),
    }
}

fn fold(
    interp: &Interpreter<'_>,
    receiver: &Value,
    args: &CallArgs,
    op: fn(&ValueSet, &ValueSet) -> ValueSet,
) -> EvalResult {
    let mut acc = snapshot(receiver);
    for other in &args.positional {
        acc = op(&acc, &as_set(interp, other)?);
    }
    Ok(rewrap(receiver, acc))
}

pub(super) fn call(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    name: &str,
    args: CallArgs,
) -> EvalResult {
    match name {
        "copy" => {
            args.arity(name, 0, 0)?;
            Ok(rewrap(receiver, snapshot(receiver)))
        }
        "union" => {
            args.no_keywords(name)?;
            fold(interp, receiver, &args, ValueSet::union)
        }
        "intersection" => {
            args.no_keywords(name)?;
            fold(interp, receiver, &args, ValueSet::intersection)
        }
        "difference" => {
            args.no_keywords(name)?;
            fold(interp, receiver, &args, ValueSet::difference)
        }
        "issubset" => {
            args.arity(name, 1, 1)?;
            let other = as_set(interp, &args.arg(0))?;
            Ok(Value::Bool(snapshot(receiver).is_subset(&other)))
        }
        "issuperset" => {
            args.arity(name, 1, 1)?;
            let other = as_set(interp, &args.arg(0))?;
            Ok(Value::Bool(other.is_subset(&snapshot(receiver))))
        }
        _ => {
            let Value::Set(set) = receiver else {
                return Err(attribute_error("frozenset", name));
            };
            match name {
                "add" => {
                    args.arity(name, 1, 1)?;
                    set.borrow_mut().insert(args.arg(0))?;
                    Ok(Value::None)
                }
                "clear" => {
                    args.arity(name, 0, 0)?;
                    set.borrow_mut().clear();
                    Ok(Value::None)
                }
                "discard" => {
                    args.arity(name, 1, 1)?;
                    set.borrow_mut().remove(&args.arg(0))?;
                    Ok(Value::None)
                }
                "remove" => {
                    args.arity(name, 1, 1)?;
                    let item = args.arg(0);
                    if set.borrow_mut().remove(&item)? {
                        Ok(Value::None)
                    } else {
                        Err(key_error(item))
                    }
                }
                "pop" => {
                    args.arity(name, 0, 0)?;
                    set.borrow_mut()
                        .pop_first()
                        .ok_or_else(|| key_error(Value::str("pop from an empty set")))
                }
                "update" => {
                    args.no_keywords(name)?;
                    let mut others = Vec::with_capacity(args.len());
                    for other in &args.positional {
                        others.push(as_set(interp, other)?);
                    }
                    let mut set = set.borrow_mut();
                    for other in others {
                        for value in other.iter() {
                            set.insert(value.clone())?;
                        }
                    }
                    Ok(Value::None)
                }
                other => Err(attribute_error("set", other)),
            }
        }
    }
}
