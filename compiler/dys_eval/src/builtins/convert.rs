//! Calling a builtin type object: `int("7")`, `list(range(3))`, ...

use std::rc::Rc;

use crate::accounting::ResourceLimits;
use crate::errors::{exception, resource, type_error, value_error, EvalResult, ResourceKind};
use crate::interpreter::Interpreter;
use crate::iter::{collect, iterate};
use crate::native::CallArgs;
use crate::value::{BuiltinType, Dict, ExcType, RangeValue, SliceValue, Value, ValueSet};

/// An `int` argument where an index is required.
pub(crate) fn index_arg(value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

/// Truncate a float toward zero.
#[allow(
    clippy::cast_possible_truncation,
    reason = "range checked before the cast"
)]
pub(crate) fn float_to_int(f: f64) -> EvalResult<i64> {
    if f.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(exception(
            ExcType::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    let t = f.trunc();
    if t.abs() >= 9.223_372_036_854_775_807e18 {
        return Err(exception(ExcType::OverflowError, "int too large to convert"));
    }
    Ok(t as i64)
}

/// Parse an integer literal the way `int(s, base)` does.
fn parse_int(text: &str, base: u32) -> EvalResult<i64> {
    let invalid = || value_error(format!("invalid literal for int() with base {base}: {}", crate::value::repr_str(text)));
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (base, digits) = {
        let lower = digits.to_ascii_lowercase();
        let prefixed = |p: &str| lower.starts_with(p);
        match base {
            0 if prefixed("0x") => (16, &digits[2..]),
            0 if prefixed("0o") => (8, &digits[2..]),
            0 if prefixed("0b") => (2, &digits[2..]),
            0 => (10, digits),
            16 if prefixed("0x") => (16, &digits[2..]),
            8 if prefixed("0o") => (8, &digits[2..]),
            2 if prefixed("0b") => (2, &digits[2..]),
            b => (b, digits),
        }
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if !cleaned.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    let magnitude = i128::from_str_radix(&cleaned, base).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| exception(ExcType::OverflowError, "int too large to convert"))
}

fn parse_float(text: &str) -> EvalResult<f64> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let unsigned = lower.trim_start_matches(['+', '-']);
    let negative = lower.starts_with('-');
    let special = match unsigned {
        "inf" | "infinity" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    };
    if let Some(value) = special {
        return Ok(if negative { -value } else { value });
    }
    let valid = !trimmed.is_empty()
        && !trimmed.contains("__")
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '_'));
    let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if valid => Ok(value),
        _ => Err(value_error(format!(
            "could not convert string to float: {}",
            crate::value::repr_str(text)
        ))),
    }
}

fn to_int(value: &Value, base: Option<i64>) -> EvalResult {
    if let Some(base) = base {
        let Value::Str(s) = value else {
            return Err(type_error(
                "int() can't convert non-string with explicit base",
            ));
        };
        let base = u32::try_from(base)
            .ok()
            .filter(|b| *b == 0 || (2..=36).contains(b))
            .ok_or_else(|| value_error("int() base must be >= 2 and <= 36, or 0"))?;
        return parse_int(s, base).map(Value::Int);
    }
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(*f).map(Value::Int),
        Value::Str(s) => parse_int(s, 10).map(Value::Int),
        Value::Bytes(b) => {
            let text = String::from_utf8_lossy(b);
            parse_int(&text, 10).map(Value::Int)
        }
        other => Err(type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> EvalResult {
    match value {
        Value::Str(s) => parse_float(s).map(Value::Float),
        other => other.as_float().map(Value::Float).ok_or_else(|| {
            type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_str(mut args: CallArgs) -> EvalResult {
    let encoding = args.take(1, "encoding");
    args.take(2, "errors");
    args.no_extra_keywords("str")?;
    args.positional_arity("str", 0, 3)?;
    match (args.get(0), encoding) {
        (None, _) => Ok(Value::str("")),
        (Some(Value::Bytes(b)), Some(_)) => decode_utf8(b),
        (Some(value), None) => Ok(Value::string(value.to_str())),
        (Some(other), Some(_)) => Err(type_error(format!(
            "decoding to str: need a bytes-like object, {} found",
            other.type_name()
        ))),
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> EvalResult {
    std::str::from_utf8(bytes)
        .map(Value::str)
        .map_err(|err| {
            exception(
                ExcType::UnicodeDecodeError,
                format!(
                    "'utf-8' codec can't decode byte at position {}: invalid start byte",
                    err.valid_up_to()
                ),
            )
        })
}

fn to_bytes(interp: &Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let encoding = args.take(1, "encoding");
    args.take(2, "errors");
    args.no_extra_keywords("bytes")?;
    args.positional_arity("bytes", 0, 3)?;
    match (args.get(0), encoding) {
        (None, _) => Ok(Value::bytes(&[])),
        (Some(Value::Str(s)), Some(_)) => Ok(Value::bytes(s.as_bytes())),
        (Some(Value::Str(_)), None) => Err(type_error("string argument without an encoding")),
        (Some(Value::Int(n)), None) => {
            let n = usize::try_from(*n).map_err(|_| value_error("negative count"))?;
            if n > interp.limits.max_string_length {
                return Err(resource(
                    ResourceKind::ValueSize,
                    "Sorry, I will not evaluate something this long.",
                ));
            }
            Ok(Value::Bytes(Rc::from(vec![0u8; n])))
        }
        (Some(Value::Bytes(b)), None) => Ok(Value::Bytes(Rc::clone(b))),
        (Some(value), None) => {
            let mut out = Vec::new();
            for item in iterate(value)? {
                let byte = index_arg(&item)?;
                out.push(
                    u8::try_from(byte).map_err(|_| value_error("bytes must be in range(0, 256)"))?,
                );
            }
            Ok(Value::Bytes(Rc::from(out)))
        }
        (Some(_), Some(_)) => Err(type_error("encoding without a string argument")),
    }
}

/// Key/value pairs of a mapping or of an iterable of pairs, as `dict()` and
/// `dict.update` accept them.
pub(crate) fn mapping_pairs(
    source: &Value,
    limits: &ResourceLimits,
) -> EvalResult<Vec<(Value, Value)>> {
    if let Value::Dict(other) = source {
        return Ok(other
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect());
    }
    let mut pairs = Vec::new();
    for (index, item) in collect(source, limits)?.into_iter().enumerate() {
        let pair = collect(&item, limits).map_err(|_| {
            type_error(format!(
                "cannot convert dictionary update sequence element #{index} to a sequence"
            ))
        })?;
        let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
            value_error(format!(
                "dictionary update sequence element #{index} has length {}; 2 is required",
                pair.len()
            ))
        })?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn to_dict(interp: &Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.positional_arity("dict", 0, 1)?;
    let mut dict = Dict::new();
    if let Some(source) = args.get(0) {
        for (key, value) in mapping_pairs(source, &interp.limits)? {
            dict.insert(key, value)?;
        }
    }
    for (key, value) in args.keywords {
        dict.insert_str(&key, value);
    }
    Ok(Value::dict(dict))
}

fn to_range(args: &CallArgs) -> EvalResult {
    args.arity("range", 1, 3)?;
    let ints: Vec<i64> = args
        .positional
        .iter()
        .map(index_arg)
        .collect::<EvalResult<_>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(type_error("range expected at most 3 arguments")),
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }
    Ok(Value::Range(RangeValue { start, stop, step }))
}

fn to_slice(args: &CallArgs) -> EvalResult {
    args.arity("slice", 1, 3)?;
    let (lower, upper, step) = match args.positional.as_slice() {
        [upper] => (Value::None, upper.clone(), Value::None),
        [lower, upper] => (lower.clone(), upper.clone(), Value::None),
        [lower, upper, step] => (lower.clone(), upper.clone(), step.clone()),
        _ => return Err(type_error("slice expected at most 3 arguments")),
    };
    Ok(Value::Slice(Rc::new(SliceValue { lower, upper, step })))
}

/// `ty(*args)`.
pub(crate) fn construct(interp: &mut Interpreter<'_>, ty: BuiltinType, mut args: CallArgs) -> EvalResult {
    let name = ty.name();
    match ty {
        BuiltinType::Bool => {
            args.arity(name, 0, 1)?;
            Ok(Value::Bool(args.get(0).is_some_and(Value::is_truthy)))
        }
        BuiltinType::Int => {
            let base = args.take(1, "base");
            args.no_extra_keywords(name)?;
            args.positional_arity(name, 0, 2)?;
            let base = match base {
                Some(base) => Some(index_arg(&base)?),
                None => None,
            };
            match args.get(0) {
                None if base.is_some() => Err(type_error("int() missing string argument")),
                None => Ok(Value::Int(0)),
                Some(value) => to_int(value, base),
            }
        }
        BuiltinType::Float => {
            args.arity(name, 0, 1)?;
            args.get(0).map_or(Ok(Value::Float(0.0)), to_float)
        }
        BuiltinType::Str => to_str(args),
        BuiltinType::Bytes => to_bytes(interp, args),
        BuiltinType::List | BuiltinType::Tuple | BuiltinType::Set | BuiltinType::FrozenSet => {
            args.arity(name, 0, 1)?;
            let items = match args.get(0) {
                Some(value) => collect(value, &interp.limits)?,
                None => Vec::new(),
            };
            Ok(match ty {
                BuiltinType::List => Value::list(items),
                BuiltinType::Tuple => Value::tuple(items),
                BuiltinType::Set => Value::set(ValueSet::from_values(items)?),
                _ => Value::FrozenSet(Rc::new(ValueSet::from_values(items)?)),
            })
        }
        BuiltinType::Dict => to_dict(interp, args),
        BuiltinType::Range => to_range(&args),
        BuiltinType::Slice => to_slice(&args),
    }
}
