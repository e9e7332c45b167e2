//! Binary, unary and comparison operators.
//!
//! Integers are 64-bit and checked: results that do not fit raise
//! `OverflowError`. Operators that can build large values (`+`, `*`, `**`)
//! are bounded by the session's [`ResourceLimits`] before they allocate.

use std::cmp::Ordering;

use dys_ir::{BinaryOp, CmpOp, UnaryOp};

use crate::accounting::ResourceLimits;
use crate::errors::{
    division_by_zero, exception, float_division_by_zero, modulo_by_zero, not_implemented,
    overflow_error, resource, type_error, unsupported_operands, value_error, EvalError,
    EvalResult, ResourceKind,
};
use crate::value::{with_set, ExcType, Value};

/// A number operand.
#[derive(Copy, Clone, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss, reason = "int to float promotion")]
fn to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

/// Apply a binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value, limits: &ResourceLimits) -> EvalResult {
    match op {
        BinaryOp::Add => add(left, right, limits),
        BinaryOp::Sub => sub(left, right),
        BinaryOp::Mult => mult(left, right, limits),
        BinaryOp::Div => true_div(left, right),
        BinaryOp::FloorDiv => floor_div(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Pow => power(left, right, limits),
        BinaryOp::LShift | BinaryOp::RShift => shift(op, left, right),
        BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::BitAnd => bitwise(op, left, right),
        BinaryOp::MatMult => Err(unsupported_operands("@", left, right)),
    }
}

fn add(left: &Value, right: &Value, limits: &ResourceLimits) -> EvalResult {
    if let (Some(a), Some(b)) = (left.len(), right.len()) {
        if a.saturating_add(b) > limits.max_string_length {
            return Err(resource(
                ResourceKind::ValueSize,
                "Sorry, adding those two together would make something too long.",
            ));
        }
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::string(s))
        }
        (Value::Bytes(a), Value::Bytes(b)) => Ok(Value::bytes(&[&a[..], &b[..]].concat())),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::List(_), _) => Err(type_error(format!(
            "can only concatenate list (not \"{}\") to list",
            right.type_name()
        ))),
        (Value::Str(_), _) => Err(type_error(format!(
            "can only concatenate str (not \"{}\") to str",
            right.type_name()
        ))),
        _ => arith(left, right, "+", i64::checked_add, |a, b| a + b, "addition"),
    }
}

fn sub(left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Set(_) | Value::FrozenSet(_), Value::Set(_) | Value::FrozenSet(_)) => {
            set_op(left, right, |a, b| a.difference(b))
        }
        _ => arith(left, right, "-", i64::checked_sub, |a, b| a - b, "subtraction"),
    }
}

fn arith(
    left: &Value,
    right: &Value,
    symbol: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
    name: &str,
) -> EvalResult {
    match (num(left), num(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| overflow_error(name)),
        (Some(a), Some(b)) => Ok(Value::Float(float_op(to_f64(a), to_f64(b)))),
        _ => Err(unsupported_operands(symbol, left, right)),
    }
}

/// Repeat a sequence `n` times after checking the result stays small.
fn repeat(seq: &Value, n: i64, limits: &ResourceLimits) -> EvalResult {
    let shown = match seq {
        Value::Str(s) => s.chars().count(),
        other => other.estimate_len(limits.max_scope_size),
    };
    let shown = i64::try_from(shown).unwrap_or(i64::MAX);
    let cap = i64::try_from(limits.max_scope_size).unwrap_or(i64::MAX);
    if n.saturating_mul(shown) >= cap {
        return Err(resource(
            ResourceKind::ValueSize,
            "Sorry, I will not evalute something that long.",
        ));
    }
    let times = usize::try_from(n).unwrap_or(0);
    Ok(match seq {
        Value::Str(s) => Value::string(s.repeat(times)),
        Value::Bytes(b) => Value::bytes(&b.repeat(times)),
        Value::List(items) => {
            let items = items.borrow();
            Value::list(items.iter().cloned().cycle().take(items.len() * times).collect())
        }
        Value::Tuple(items) => {
            Value::tuple(items.iter().cloned().cycle().take(items.len() * times).collect())
        }
        _ => return Err(type_error("can't multiply sequence by non-int")),
    })
}

fn is_sequence(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::Bytes(_) | Value::List(_) | Value::Tuple(_)
    )
}

fn mult(left: &Value, right: &Value, limits: &ResourceLimits) -> EvalResult {
    match (left, right) {
        (seq, Value::Int(_) | Value::Bool(_)) if is_sequence(seq) => {
            repeat(seq, right.as_int().unwrap_or(0), limits)
        }
        (Value::Int(_) | Value::Bool(_), seq) if is_sequence(seq) => {
            repeat(seq, left.as_int().unwrap_or(0), limits)
        }
        _ if is_sequence(left) || is_sequence(right) => {
            let other = if is_sequence(left) { right } else { left };
            Err(type_error(format!(
                "can't multiply sequence by non-int of type '{}'",
                other.type_name()
            )))
        }
        _ => arith(left, right, "*", i64::checked_mul, |a, b| a * b, "multiplication"),
    }
}

fn true_div(left: &Value, right: &Value) -> EvalResult {
    match (num(left), num(right)) {
        (Some(Num::Int(_)), Some(Num::Int(0))) => Err(division_by_zero()),
        (Some(a), Some(b)) => {
            let divisor = to_f64(b);
            if divisor == 0.0 {
                return Err(float_division_by_zero());
            }
            Ok(Value::Float(to_f64(a) / divisor))
        }
        _ => Err(unsupported_operands("/", left, right)),
    }
}

/// Floor division and modulo of integers, rounding toward negative
/// infinity.
fn int_divmod(a: i64, b: i64) -> Result<(i64, i64), EvalError> {
    if b == 0 {
        return Err(modulo_by_zero());
    }
    let q = a.checked_div(b).ok_or_else(|| overflow_error("division"))?;
    let r = a.checked_rem(b).ok_or_else(|| overflow_error("division"))?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok((q - 1, r + b))
    } else {
        Ok((q, r))
    }
}

fn float_divmod(a: f64, b: f64) -> (f64, f64) {
    let mut r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
        r += b;
    }
    ((a - r) / b, r)
}

fn floor_div(left: &Value, right: &Value) -> EvalResult {
    match (num(left), num(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Value::Int(int_divmod(a, b)?.0)),
        (Some(a), Some(b)) => {
            let (a, b) = (to_f64(a), to_f64(b));
            if b == 0.0 {
                return Err(exception(ExcType::ZeroDivisionError, "float divmod()"));
            }
            Ok(Value::Float(float_divmod(a, b).0.floor()))
        }
        _ => Err(unsupported_operands("//", left, right)),
    }
}

fn modulo(left: &Value, right: &Value) -> EvalResult {
    if matches!(left, Value::Str(_) | Value::Bytes(_)) {
        return Err(not_implemented("String formatting is not supported"));
    }
    match (num(left), num(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Value::Int(int_divmod(a, b)?.1)),
        (Some(a), Some(b)) => {
            let (a, b) = (to_f64(a), to_f64(b));
            if b == 0.0 {
                return Err(exception(ExcType::ZeroDivisionError, "float modulo"));
            }
            Ok(Value::Float(float_divmod(a, b).1))
        }
        _ => Err(unsupported_operands("%", left, right)),
    }
}

/// `divmod(a, b)`.
pub fn divmod(left: &Value, right: &Value) -> EvalResult {
    match (num(left), num(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => {
            let (q, r) = int_divmod(a, b)?;
            Ok(Value::tuple(vec![Value::Int(q), Value::Int(r)]))
        }
        (Some(a), Some(b)) => {
            let (a, b) = (to_f64(a), to_f64(b));
            if b == 0.0 {
                return Err(exception(ExcType::ZeroDivisionError, "float divmod()"));
            }
            let (q, r) = float_divmod(a, b);
            Ok(Value::tuple(vec![Value::Float(q.floor()), Value::Float(r)]))
        }
        _ => Err(unsupported_operands("divmod()", left, right)),
    }
}

fn abs_num(value: &Value) -> Result<f64, EvalError> {
    num(value).map(|n| to_f64(n).abs()).ok_or_else(|| {
        type_error(format!(
            "bad operand type for abs(): '{}'",
            value.type_name()
        ))
    })
}

/// `a ** b`, refusing operands above the power cap.
pub fn power(left: &Value, right: &Value, limits: &ResourceLimits) -> EvalResult {
    #[allow(clippy::cast_precision_loss, reason = "cap comparison only")]
    let cap = limits.max_power as f64;
    if abs_num(left)? > cap || abs_num(right)? > cap {
        return Err(resource(
            ResourceKind::ValueSize,
            format!(
                "Sorry! I don't want to evaluate {} ** {}",
                left.repr(),
                right.repr()
            ),
        ));
    }
    match (num(left), num(right)) {
        (Some(Num::Int(base)), Some(Num::Int(exp))) if exp >= 0 => {
            let exp = u32::try_from(exp).map_err(|_| overflow_error("exponentiation"))?;
            base.checked_pow(exp)
                .map(Value::Int)
                .ok_or_else(|| overflow_error("exponentiation"))
        }
        (Some(base), Some(exp)) => {
            let (base, exp) = (to_f64(base), to_f64(exp));
            if base == 0.0 && exp < 0.0 {
                return Err(exception(
                    ExcType::ZeroDivisionError,
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if base < 0.0 && exp.fract() != 0.0 {
                return Err(value_error("math domain error"));
            }
            Ok(Value::Float(base.powf(exp)))
        }
        _ => Err(unsupported_operands("** or pow()", left, right)),
    }
}

fn shift(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let (Some(a), Some(n)) = (left.as_int(), right.as_int()) else {
        return Err(unsupported_operands(op.symbol(), left, right));
    };
    if n < 0 {
        return Err(value_error("negative shift count"));
    }
    let result = if op == BinaryOp::LShift {
        if a == 0 {
            0
        } else {
            let n = u32::try_from(n).ok().filter(|n| *n < 64);
            n.and_then(|n| a.checked_shl(n).filter(|r| r >> n == a))
                .ok_or_else(|| overflow_error("left shift"))?
        }
    } else {
        let n = u32::try_from(n.min(63)).unwrap_or(63);
        a >> n
    };
    Ok(Value::Int(result))
}

fn set_op(
    left: &Value,
    right: &Value,
    f: impl FnOnce(&crate::value::ValueSet, &crate::value::ValueSet) -> crate::value::ValueSet,
) -> EvalResult {
    let result = with_set(left, |a| with_set(right, |b| f(a, b)));
    Ok(match left {
        Value::FrozenSet(_) => Value::FrozenSet(std::rc::Rc::new(result)),
        _ => Value::set(result),
    })
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            _ => a & b,
        })),
        (Value::Set(_) | Value::FrozenSet(_), Value::Set(_) | Value::FrozenSet(_)) => {
            set_op(left, right, |a, b| match op {
                BinaryOp::BitOr => a.union(b),
                BinaryOp::BitXor => a.symmetric_difference(b),
                _ => a.intersection(b),
            })
        }
        _ => match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => Ok(Value::Int(match op {
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
                _ => a & b,
            })),
            _ => Err(unsupported_operands(op.symbol(), left, right)),
        },
    }
}

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult {
    let bad = || {
        type_error(format!(
            "bad operand type for unary {}: '{}'",
            op.symbol(),
            operand.type_name()
        ))
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::USub => match num(operand) {
            Some(Num::Int(i)) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| overflow_error("negation")),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(bad()),
        },
        UnaryOp::UAdd => match num(operand) {
            Some(Num::Int(i)) => Ok(Value::Int(i)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(bad()),
        },
        UnaryOp::Invert => operand.as_int().map(|i| Value::Int(!i)).ok_or_else(bad),
    }
}

/// Evaluate one comparison.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    Ok(match op {
        CmpOp::Eq => left.py_eq(right),
        CmpOp::NotEq => !left.py_eq(right),
        CmpOp::Is => left.is_same(right),
        CmpOp::IsNot => !left.is_same(right),
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            if let (Value::Set(_) | Value::FrozenSet(_), Value::Set(_) | Value::FrozenSet(_)) =
                (left, right)
            {
                return Ok(set_compare(op, left, right));
            }
            let ordering = partial_order(left, right).ok_or_else(|| {
                type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            match ordering {
                None => false,
                Some(ordering) => match op {
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::LtE => ordering != Ordering::Greater,
                    CmpOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
            }
        }
    })
}

fn set_compare(op: CmpOp, left: &Value, right: &Value) -> bool {
    with_set(left, |a| {
        with_set(right, |b| match op {
            CmpOp::Lt => a.len() < b.len() && a.is_subset(b),
            CmpOp::LtE => a.is_subset(b),
            CmpOp::Gt => b.len() < a.len() && b.is_subset(a),
            _ => b.is_subset(a),
        })
    })
}

/// Ordering of two values.
///
/// The outer `None` means the types are not orderable; the inner `None`
/// means the values are unordered (NaN).
fn partial_order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(Some(a.cmp(b))),
        (Value::Bytes(a), Value::Bytes(b)) => Some(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => seq_order(&a.borrow(), &b.borrow()),
        (Value::Tuple(a), Value::Tuple(b)) => seq_order(a, b),
        _ => match (num(left), num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Some(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Some(to_f64(a).partial_cmp(&to_f64(b))),
            _ => None,
        },
    }
}

fn seq_order(a: &[Value], b: &[Value]) -> Option<Option<Ordering>> {
    for (x, y) in a.iter().zip(b) {
        if x.py_eq(y) {
            continue;
        }
        return partial_order(x, y);
    }
    Some(Some(a.len().cmp(&b.len())))
}

/// Total order used by `sorted`, `min` and `max`; NaN compares equal.
pub fn order(left: &Value, right: &Value) -> EvalResult<Ordering> {
    match partial_order(left, right) {
        Some(ordering) => Ok(ordering.unwrap_or(Ordering::Equal)),
        None => Err(type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// An integral float as an int.
#[allow(
    clippy::cast_possible_truncation,
    reason = "range checked before the cast"
)]
pub fn float_as_int(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18).then(|| f as i64)
}

/// `item in container`.
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Bytes(haystack) => match item {
            Value::Bytes(needle) => Ok(needle.is_empty()
                || haystack.windows(needle.len()).any(|w| w == &needle[..])),
            Value::Int(byte) => Ok(u8::try_from(*byte).is_ok_and(|b| haystack.contains(&b))),
            other => Err(type_error(format!(
                "a bytes-like object is required, not '{}'",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| v.is_same(item) || v.py_eq(item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.is_same(item) || v.py_eq(item))),
        Value::Dict(dict) => dict.borrow().contains(item),
        Value::Set(set) => set.borrow().contains(item),
        Value::FrozenSet(set) => set.contains(item),
        Value::Range(range) => Ok(match item {
            Value::Int(_) | Value::Bool(_) => item.as_int().is_some_and(|i| range.contains(i)),
            Value::Float(f) => float_as_int(*f).is_some_and(|i| range.contains(i)),
            _ => false,
        }),
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests;
