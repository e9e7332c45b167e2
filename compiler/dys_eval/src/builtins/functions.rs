//! Builtin functions.

use std::cmp::Ordering;
use std::rc::Rc;

use dys_ir::BinaryOp;

use super::convert::{float_to_int, index_arg};
use crate::errors::{
    exception, overflow_error, type_error, value_error, EvalError, EvalResult,
};
use crate::interpreter::Interpreter;
use crate::iter::{collect, iterate};
use crate::native::CallArgs;
use crate::operators;
use crate::value::{ExcType, Value};

/// Sort `items`, optionally by `key(item)`, keeping equal items in order.
pub(crate) fn sort_values(
    interp: &mut Interpreter<'_>,
    items: Vec<Value>,
    key: Option<&Value>,
    reverse: bool,
) -> EvalResult<Vec<Value>> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let k = match key {
            Some(key) => interp.call_value(key, CallArgs::new(vec![item.clone()]))?,
            None => item.clone(),
        };
        keyed.push((k, item));
    }
    let mut failure: Option<EvalError> = None;
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = if reverse {
            operators::order(b, a)
        } else {
            operators::order(a, b)
        };
        ordering.unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(keyed.into_iter().map(|(_, item)| item).collect()),
    }
}

fn optional_key(args: &mut CallArgs) -> Option<Value> {
    args.take_keyword("key").filter(|k| !k.is_none())
}

pub(super) fn abs(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("abs", 1, 1)?;
    match args.arg(0) {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| overflow_error("abs")),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        other => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn all(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("all", 1, 1)?;
    Ok(Value::Bool(iterate(&args.arg(0))?.all(|v| v.is_truthy())))
}

pub(super) fn any(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("any", 1, 1)?;
    Ok(Value::Bool(iterate(&args.arg(0))?.any(|v| v.is_truthy())))
}

fn radix(args: &CallArgs, func: &str, prefix: &str, digits: fn(u64) -> String) -> EvalResult {
    args.arity(func, 1, 1)?;
    let n = index_arg(&args.arg(0))?;
    let sign = if n < 0 { "-" } else { "" };
    Ok(Value::string(format!("{sign}{prefix}{}", digits(n.unsigned_abs()))))
}

pub(super) fn bin(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    radix(&args, "bin", "0b", |n| format!("{n:b}"))
}

pub(super) fn hex(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    radix(&args, "hex", "0x", |n| format!("{n:x}"))
}

pub(super) fn oct(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    radix(&args, "oct", "0o", |n| format!("{n:o}"))
}

pub(super) fn callable(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("callable", 1, 1)?;
    Ok(Value::Bool(args.arg(0).is_callable()))
}

pub(super) fn chr(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("chr", 1, 1)?;
    let code = index_arg(&args.arg(0))?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::string(c.to_string()))
        .ok_or_else(|| value_error("chr() arg not in range(0x110000)"))
}

pub(super) fn ord(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("ord", 1, 1)?;
    match args.arg(0) {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                _ => Err(type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        Value::Bytes(b) if b.len() == 1 => Ok(Value::Int(i64::from(b[0]))),
        Value::Bytes(b) => Err(type_error(format!(
            "ord() expected a character, but string of length {} found",
            b.len()
        ))),
        other => Err(type_error(format!(
            "ord() expected string of length 1, but {} found",
            other.type_name()
        ))),
    }
}

pub(super) fn classmethod(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("classmethod", 1, 1)?;
    Ok(Value::ClassMethod(Rc::new(args.arg(0))))
}

pub(super) fn divmod(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("divmod", 2, 2)?;
    operators::divmod(&args.arg(0), &args.arg(1))
}

pub(super) fn enumerate(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let start = args.take(1, "start").unwrap_or(Value::Int(0));
    args.no_extra_keywords("enumerate")?;
    args.positional_arity("enumerate", 1, 2)?;
    let mut index = index_arg(&start)?;
    let mut pairs = Vec::new();
    for item in collect(&args.arg(0), &interp.limits)? {
        pairs.push(Value::tuple(vec![Value::Int(index), item]));
        index = index.checked_add(1).ok_or_else(|| overflow_error("enumerate"))?;
    }
    Ok(Value::list(pairs))
}

pub(super) fn filter(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("filter", 2, 2)?;
    let func = args.arg(0);
    let mut kept = Vec::new();
    for item in collect(&args.arg(1), &interp.limits)? {
        let keep = if func.is_none() {
            item.is_truthy()
        } else {
            interp
                .call_value(&func, CallArgs::new(vec![item.clone()]))?
                .is_truthy()
        };
        if keep {
            kept.push(item);
        }
    }
    Ok(Value::list(kept))
}

fn is_instance(value: &Value, class: &Value) -> EvalResult<bool> {
    Ok(match class {
        Value::Type(ty) => ty.contains(value),
        Value::ExceptionType(ty) => match value {
            Value::Exception(exc) => exc.is_instance_of(*ty),
            _ => false,
        },
        Value::Class(class) => match value {
            Value::Instance(instance) => instance.class.is_subclass_of(class),
            Value::Exception(exc) => exc.class.as_ref().is_some_and(|c| c.is_subclass_of(class)),
            _ => false,
        },
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if is_instance(value, class)? {
                    return Ok(true);
                }
            }
            false
        }
        _ => {
            return Err(type_error(
                "isinstance() arg 2 must be a type or tuple of types",
            ))
        }
    })
}

pub(super) fn isinstance(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("isinstance", 2, 2)?;
    Ok(Value::Bool(is_instance(&args.arg(0), &args.arg(1))?))
}

fn is_subclass(class: &Value, parent: &Value) -> EvalResult<bool> {
    use crate::value::BuiltinType;
    Ok(match (class, parent) {
        (_, Value::Tuple(parents)) => {
            for parent in parents.iter() {
                if is_subclass(class, parent)? {
                    return Ok(true);
                }
            }
            false
        }
        (Value::Type(a), Value::Type(b)) => a == b || (*a == BuiltinType::Bool && *b == BuiltinType::Int),
        (Value::ExceptionType(a), Value::ExceptionType(b)) => a.is_subclass_of(*b),
        (Value::Class(a), Value::Class(b)) => a.is_subclass_of(b),
        (Value::Class(a), Value::ExceptionType(b)) => a.exc_base.is_some_and(|e| e.is_subclass_of(*b)),
        (Value::Type(_) | Value::ExceptionType(_) | Value::Class(_), _) => {
            return Err(type_error(
                "issubclass() arg 2 must be a class or tuple of classes",
            ))
        }
        _ => return Err(type_error("issubclass() arg 1 must be a class")),
    })
}

pub(super) fn issubclass(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("issubclass", 2, 2)?;
    Ok(Value::Bool(is_subclass(&args.arg(0), &args.arg(1))?))
}

pub(super) fn iter(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("iter", 1, 1)?;
    Ok(Value::list(collect(&args.arg(0), &interp.limits)?))
}

pub(super) fn len(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("len", 1, 1)?;
    let value = args.arg(0);
    value
        .len()
        .and_then(|n| i64::try_from(n).ok())
        .map(Value::Int)
        .ok_or_else(|| {
            type_error(format!(
                "object of type '{}' has no len()",
                value.type_name()
            ))
        })
}

pub(super) fn map(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.no_keywords("map")?;
    if args.len() < 2 {
        return Err(type_error("map() must have at least two arguments."));
    }
    let func = args.arg(0);
    let mut columns = Vec::with_capacity(args.len() - 1);
    for iterable in &args.positional[1..] {
        columns.push(collect(iterable, &interp.limits)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(rows);
    for row in 0..rows {
        let call = columns.iter().map(|column| column[row].clone()).collect();
        out.push(interp.call_value(&func, CallArgs::new(call))?);
    }
    Ok(Value::list(out))
}

fn extreme(interp: &mut Interpreter<'_>, mut args: CallArgs, func: &str, want: Ordering) -> EvalResult {
    let key = optional_key(&mut args);
    let default = args.take_keyword("default");
    args.no_extra_keywords(func)?;
    let items = match args.positional.len() {
        0 => {
            return Err(type_error(format!(
                "{func} expected at least 1 argument, got 0"
            )))
        }
        1 => collect(&args.arg(0), &interp.limits)?,
        _ => {
            if default.is_some() {
                return Err(type_error(format!(
                    "Cannot specify a default for {func}() with multiple positional arguments"
                )));
            }
            args.positional
        }
    };
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let k = match &key {
            Some(key) => interp.call_value(key, CallArgs::new(vec![item.clone()]))?,
            None => item.clone(),
        };
        let replace = match &best {
            None => true,
            Some((best_key, _)) => operators::order(&k, best_key)? == want,
        };
        if replace {
            best = Some((k, item));
        }
    }
    match (best, default) {
        (Some((_, item)), _) => Ok(item),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(value_error(format!("{func}() iterable argument is empty"))),
    }
}

pub(super) fn max(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    extreme(interp, args, "max", Ordering::Greater)
}

pub(super) fn min(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    extreme(interp, args, "min", Ordering::Less)
}

/// `base ** exp % modulus` without overflow.
fn mod_pow(base: i64, exp: i64, modulus: i64) -> EvalResult<i64> {
    if modulus == 0 {
        return Err(value_error("pow() 3rd argument cannot be 0"));
    }
    if exp < 0 {
        return Err(value_error(
            "pow() 2nd argument cannot be negative when 3rd argument specified",
        ));
    }
    let m = i128::from(modulus);
    let mut result: i128 = 1;
    let mut b = i128::from(base).rem_euclid(m);
    let mut e = exp;
    while e > 0 {
        if e & 1 == 1 {
            result = (result * b).rem_euclid(m);
        }
        b = (b * b).rem_euclid(m);
        e >>= 1;
    }
    // Python's result takes the modulus's sign.
    if modulus < 0 && result != 0 {
        result += m;
    }
    i64::try_from(result).map_err(|_| overflow_error("pow"))
}

pub(super) fn pow(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let base = args.take(0, "base");
    let exp = args.take(1, "exp");
    let modulus = args.take(2, "mod").filter(|m| !m.is_none());
    args.no_extra_keywords("pow")?;
    let (Some(base), Some(exp)) = (base, exp) else {
        return Err(type_error("pow() missing required argument 'base' or 'exp'"));
    };
    match modulus {
        None => operators::power(&base, &exp, &interp.limits),
        Some(modulus) => match (base.as_int(), exp.as_int(), modulus.as_int()) {
            (Some(b), Some(e), Some(m)) => Ok(Value::Int(mod_pow(b, e, m)?)),
            _ => Err(type_error(
                "pow() 3rd argument not allowed unless all arguments are integers",
            )),
        },
    }
}

/// Longest `sep` or `end` accepted by `print`.
const MAX_PRINT_AFFIX: usize = 5;

pub(super) fn print(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let mut affix = |name: &str, default: &str| -> EvalResult<String> {
        match args.take_keyword(name) {
            None | Some(Value::None) => Ok(default.to_string()),
            Some(Value::Str(s)) if s.chars().count() <= MAX_PRINT_AFFIX => Ok(s.to_string()),
            Some(Value::Str(_)) => Err(value_error(format!(
                "Sorry, {name} must be at most {MAX_PRINT_AFFIX} characters"
            ))),
            Some(other) => Err(type_error(format!(
                "{name} must be None or a string, not {}",
                other.type_name()
            ))),
        }
    };
    let sep = affix("sep", " ")?;
    let end = affix("end", "\n")?;
    args.no_extra_keywords("print")?;
    let parts: Vec<String> = args.positional.iter().map(Value::to_str).collect();
    let mut text = parts.join(&sep);
    text.push_str(&end);
    interp.print(&text);
    Ok(Value::None)
}

pub(super) fn reversed(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("reversed", 1, 1)?;
    let value = args.arg(0);
    if matches!(value, Value::Set(_) | Value::FrozenSet(_)) {
        return Err(type_error(format!(
            "'{}' object is not reversible",
            value.type_name()
        )));
    }
    let mut items = collect(&value, &interp.limits)?;
    items.reverse();
    Ok(Value::list(items))
}

/// Round half to even at `digits` decimal places.
///
/// Positive `digits` round the exact binary value through fixed-point
/// formatting, so `2.675` (stored just below) goes down to `2.67`.
fn round_float(x: f64, digits: i32) -> f64 {
    if digits == 0 || !x.is_finite() {
        return x.round_ties_even();
    }
    if let Ok(places) = usize::try_from(digits) {
        return format!("{x:.places$}").parse().unwrap_or(x);
    }
    let scale = 10f64.powi(digits);
    let rounded = (x * scale).round_ties_even() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        x
    }
}

pub(super) fn round(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let number = args.take(0, "number");
    let digits = args.take(1, "ndigits").filter(|d| !d.is_none());
    args.no_extra_keywords("round")?;
    let Some(number) = number else {
        return Err(type_error("round() missing required argument 'number' (pos 1)"));
    };
    let digits = match digits {
        Some(d) => Some(i32::try_from(index_arg(&d)?.clamp(-400, 400)).unwrap_or(0)),
        None => None,
    };
    match (&number, digits) {
        (Value::Float(f), None) => Ok(Value::Int(float_to_int(f.round_ties_even())?)),
        (Value::Float(f), Some(d)) => Ok(Value::Float(round_float(*f, d))),
        (Value::Int(_) | Value::Bool(_), None) => Ok(Value::Int(number.as_int().unwrap_or(0))),
        (Value::Int(_) | Value::Bool(_), Some(d)) if d >= 0 => {
            Ok(Value::Int(number.as_int().unwrap_or(0)))
        }
        (Value::Int(_) | Value::Bool(_), Some(d)) => {
            let i = number.as_int().unwrap_or(0);
            let scale = 10i64.checked_pow(d.unsigned_abs()).unwrap_or(i64::MAX);
            #[allow(clippy::cast_precision_loss, reason = "rounding to a power of ten")]
            let rounded = round_float(i as f64 / scale as f64, 0) * scale as f64;
            Ok(Value::Int(float_to_int(rounded)?))
        }
        (other, _) => Err(type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

pub(super) fn sorted(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let key = optional_key(&mut args);
    let reverse = args.take_keyword("reverse").is_some_and(|r| r.is_truthy());
    args.no_extra_keywords("sorted")?;
    args.positional_arity("sorted", 1, 1)?;
    let items = collect(&args.arg(0), &interp.limits)?;
    Ok(Value::list(sort_values(interp, items, key.as_ref(), reverse)?))
}

pub(super) fn sum(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let start = args.take(1, "start").unwrap_or(Value::Int(0));
    args.no_extra_keywords("sum")?;
    args.positional_arity("sum", 1, 2)?;
    if matches!(start, Value::Str(_)) {
        return Err(type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    let mut total = start;
    for item in iterate(&args.arg(0))? {
        total = operators::binary(BinaryOp::Add, &total, &item, &interp.limits)?;
    }
    Ok(total)
}

pub(super) fn zip(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let strict = args.take_keyword("strict").is_some_and(|s| s.is_truthy());
    args.no_extra_keywords("zip")?;
    let mut columns = Vec::with_capacity(args.len());
    for iterable in &args.positional {
        columns.push(collect(iterable, &interp.limits)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    if strict && columns.iter().any(|c| c.len() != rows) {
        return Err(exception(
            ExcType::ValueError,
            "zip() arguments have different lengths",
        ));
    }
    let out = (0..rows)
        .map(|row| Value::tuple(columns.iter().map(|c| c[row].clone()).collect()))
        .collect();
    Ok(Value::list(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn modular_power_takes_the_sign_of_the_modulus() {
        assert_eq!(mod_pow(2, 10, 1000).ok(), Some(24));
        assert_eq!(mod_pow(-2, 3, 5).ok(), Some(2));
        assert_eq!(mod_pow(2, 3, -5).ok(), Some(-2));
        assert!(mod_pow(2, 3, 0).is_err());
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_float(2.5, 0), 2.0);
        assert_eq!(round_float(3.5, 0), 4.0);
        assert_eq!(round_float(1.25, 1), 1.2);
    }

    #[test]
    fn rounding_follows_the_stored_decimal_value() {
        assert_eq!(round_float(2.675, 2), 2.67);
        assert_eq!(round_float(1.005, 2), 1.0);
        assert_eq!(round_float(0.1 + 0.2, 10), 0.3);
        assert_eq!(round_float(1234.5, -2), 1200.0);
    }
}
