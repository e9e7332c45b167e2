//! `math`: the float functions and integer helpers scripts may use.
//!
//! Results follow Python's `math`, including its error messages;
//! integers are 64-bit, so results past that range raise `OverflowError`.

use std::f64::consts;

use dys_eval::errors::{exception, overflow_error, type_error, value_error};
use dys_eval::iter::collect;
use dys_eval::{native, CallArgs, EvalError, EvalResult, ExcType, Interpreter, ModuleBuilder, ModuleValue, Session, Value};

type MathFn = for<'i> fn(&mut Interpreter<'i>, CallArgs) -> EvalResult;

fn domain_error() -> EvalError {
    value_error("math domain error")
}

fn real(value: &Value) -> EvalResult<f64> {
    value.as_float().ok_or_else(|| {
        type_error(format!("must be real number, not {}", value.type_name()))
    })
}

fn integer(value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

#[allow(clippy::cast_possible_truncation, reason = "range checked before the cast")]
fn to_int(f: f64) -> EvalResult<Value> {
    if f.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(exception(
            ExcType::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    if f.abs() >= 9.223_372_036_854_775_807e18 {
        return Err(exception(ExcType::OverflowError, "int too large to convert"));
    }
    Ok(Value::Int(f as i64))
}

/// A float result, rejecting NaN produced from non-NaN input.
fn checked(input: f64, result: f64) -> EvalResult {
    if result.is_nan() && !input.is_nan() {
        return Err(domain_error());
    }
    Ok(Value::Float(result))
}

fn unary(name: &str, args: &CallArgs, f: fn(f64) -> f64) -> EvalResult {
    args.arity(name, 1, 1)?;
    let x = real(&args.arg(0))?;
    checked(x, f(x))
}

fn rounding(name: &str, args: &CallArgs, f: fn(f64) -> f64) -> EvalResult {
    args.arity(name, 1, 1)?;
    match args.arg(0) {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        other => to_int(f(real(&other)?)),
    }
}

fn ceil(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    rounding("ceil", &args, f64::ceil)
}

fn floor(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    rounding("floor", &args, f64::floor)
}

fn trunc(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    rounding("trunc", &args, f64::trunc)
}

fn fabs(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("fabs", &args, f64::abs)
}

fn sqrt(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("sqrt", 1, 1)?;
    let x = real(&args.arg(0))?;
    if x < 0.0 {
        return Err(domain_error());
    }
    Ok(Value::Float(x.sqrt()))
}

fn positive_log(name: &str, args: &CallArgs, f: fn(f64) -> f64) -> EvalResult {
    args.arity(name, 1, 1)?;
    let x = real(&args.arg(0))?;
    if x <= 0.0 {
        return Err(domain_error());
    }
    Ok(Value::Float(f(x)))
}

fn log(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("log", 1, 2)?;
    let x = real(&args.arg(0))?;
    if x <= 0.0 {
        return Err(domain_error());
    }
    match args.get(1) {
        None => Ok(Value::Float(x.ln())),
        Some(base) => {
            let base = real(base)?;
            if base <= 0.0 {
                return Err(domain_error());
            }
            let denominator = base.ln();
            if denominator == 0.0 {
                return Err(exception(ExcType::ZeroDivisionError, "float division by zero"));
            }
            Ok(Value::Float(x.ln() / denominator))
        }
    }
}

fn log2(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    positive_log("log2", &args, f64::log2)
}

fn log10(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    positive_log("log10", &args, f64::log10)
}

fn log1p(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("log1p", 1, 1)?;
    let x = real(&args.arg(0))?;
    if x <= -1.0 {
        return Err(domain_error());
    }
    Ok(Value::Float(x.ln_1p()))
}

fn bounded(name: &str, args: &CallArgs, f: fn(f64) -> f64) -> EvalResult {
    args.arity(name, 1, 1)?;
    let x = real(&args.arg(0))?;
    if !(-1.0..=1.0).contains(&x) && !x.is_nan() {
        return Err(domain_error());
    }
    Ok(Value::Float(f(x)))
}

fn acos(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    bounded("acos", &args, f64::acos)
}

fn asin(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    bounded("asin", &args, f64::asin)
}

fn atan(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("atan", &args, f64::atan)
}

fn cos(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("cos", &args, f64::cos)
}

fn sin(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("sin", &args, f64::sin)
}

fn tan(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("tan", &args, f64::tan)
}

fn degrees(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("degrees", &args, f64::to_degrees)
}

fn radians(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    unary("radians", &args, f64::to_radians)
}

fn atan2(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("atan2", 2, 2)?;
    let (y, x) = (real(&args.arg(0))?, real(&args.arg(1))?);
    Ok(Value::Float(y.atan2(x)))
}

fn copysign(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("copysign", 2, 2)?;
    let (x, y) = (real(&args.arg(0))?, real(&args.arg(1))?);
    Ok(Value::Float(x.copysign(y)))
}

fn fmod(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("fmod", 2, 2)?;
    let (x, y) = (real(&args.arg(0))?, real(&args.arg(1))?);
    if y == 0.0 || x.is_infinite() {
        return Err(domain_error());
    }
    Ok(Value::Float(x % y))
}

/// IEEE 754 remainder: `x - n*y` with `n` the integer nearest `x/y`, ties
/// to even.
fn remainder(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("remainder", 2, 2)?;
    let (x, y) = (real(&args.arg(0))?, real(&args.arg(1))?);
    if x.is_nan() || y.is_nan() {
        return Ok(Value::Float(f64::NAN));
    }
    if x.is_infinite() || y == 0.0 {
        return Err(domain_error());
    }
    if y.is_infinite() {
        return Ok(Value::Float(x));
    }
    let quotient = (x / y).round_ties_even();
    Ok(Value::Float(x - quotient * y))
}

fn modf(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("modf", 1, 1)?;
    let x = real(&args.arg(0))?;
    let whole = x.trunc();
    let fraction = if x.is_infinite() { 0.0_f64.copysign(x) } else { x - whole };
    Ok(Value::tuple(vec![Value::Float(fraction), Value::Float(whole)]))
}

fn ulp(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("ulp", 1, 1)?;
    let x = real(&args.arg(0))?.abs();
    if x.is_nan() || x.is_infinite() {
        return Ok(Value::Float(x));
    }
    if x == f64::MAX {
        return Ok(Value::Float(x - f64::from_bits(x.to_bits() - 1)));
    }
    Ok(Value::Float(f64::from_bits(x.to_bits() + 1) - x))
}

fn isfinite(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("isfinite", 1, 1)?;
    Ok(Value::Bool(real(&args.arg(0))?.is_finite()))
}

fn isinf(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("isinf", 1, 1)?;
    Ok(Value::Bool(real(&args.arg(0))?.is_infinite()))
}

fn isnan(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("isnan", 1, 1)?;
    Ok(Value::Bool(real(&args.arg(0))?.is_nan()))
}

fn isclose(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("isclose", 2, 2)?;
    let rel_tol = args.take_keyword("rel_tol").map_or(Ok(1e-9), |v| real(&v))?;
    let abs_tol = args.take_keyword("abs_tol").map_or(Ok(0.0), |v| real(&v))?;
    args.no_extra_keywords("isclose")?;
    if rel_tol < 0.0 || abs_tol < 0.0 {
        return Err(value_error("tolerances must be non-negative"));
    }
    let (a, b) = (real(&args.arg(0))?, real(&args.arg(1))?);
    if a == b {
        return Ok(Value::Bool(true));
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(Value::Bool(false));
    }
    let diff = (b - a).abs();
    Ok(Value::Bool(
        diff <= (rel_tol * b).abs() || diff <= (rel_tol * a).abs() || diff <= abs_tol,
    ))
}

fn factorial(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("factorial", 1, 1)?;
    let n = integer(&args.arg(0))?;
    if n < 0 {
        return Err(value_error("factorial() not defined for negative values"));
    }
    (2..=n)
        .try_fold(1_i64, i64::checked_mul)
        .map(Value::Int)
        .ok_or_else(|| overflow_error("factorial"))
}

fn gcd_pair(a: i64, b: i64) -> EvalResult<i64> {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).map_err(|_| overflow_error("gcd"))
}

fn gcd(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.no_keywords("gcd")?;
    let mut acc = 0;
    for value in &args.positional {
        acc = gcd_pair(acc, integer(value)?)?;
    }
    Ok(Value::Int(acc))
}

fn lcm(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.no_keywords("lcm")?;
    let mut acc: i64 = 1;
    for value in &args.positional {
        let n = integer(value)?;
        if n == 0 || acc == 0 {
            acc = 0;
            continue;
        }
        let g = gcd_pair(acc, n)?;
        acc = (acc / g)
            .checked_mul(n)
            .map(i64::abs)
            .ok_or_else(|| overflow_error("lcm"))?;
    }
    Ok(Value::Int(acc))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "the float estimate is corrected with integer arithmetic"
)]
fn isqrt(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("isqrt", 1, 1)?;
    let n = integer(&args.arg(0))?;
    if n < 0 {
        return Err(value_error("isqrt() argument must be nonnegative"));
    }
    let n = n as u64;
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|sq| sq <= n) {
        root += 1;
    }
    i64::try_from(root)
        .map(Value::Int)
        .map_err(|_| overflow_error("isqrt"))
}

/// Exact float sum (Shewchuk's partials), like Python's `fsum`.
fn fsum(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("fsum", 1, 1)?;
    let mut partials: Vec<f64> = Vec::new();
    let mut special = 0.0;
    for item in collect(&args.arg(0), interp.limits())? {
        let mut x = real(&item)?;
        if !x.is_finite() {
            special += x;
            continue;
        }
        let mut kept = 0;
        for i in 0..partials.len() {
            let mut y = partials[i];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let high = x + y;
            let low = y - (high - x);
            if low != 0.0 {
                partials[kept] = low;
                kept += 1;
            }
            x = high;
        }
        partials.truncate(kept);
        partials.push(x);
    }
    if special != 0.0 || special.is_nan() {
        return Ok(Value::Float(special));
    }
    Ok(Value::Float(partials.iter().sum()))
}

fn hypot(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.no_keywords("hypot")?;
    let mut total = 0.0_f64;
    for value in &args.positional {
        total = total.hypot(real(value)?);
    }
    Ok(Value::Float(total))
}

fn dist(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("dist", 2, 2)?;
    let p = collect(&args.arg(0), interp.limits())?;
    let q = collect(&args.arg(1), interp.limits())?;
    if p.len() != q.len() {
        return Err(value_error("both points must have the same number of dimensions"));
    }
    let mut total = 0.0_f64;
    for (a, b) in p.iter().zip(&q) {
        total = total.hypot(real(a)? - real(b)?);
    }
    Ok(Value::Float(total))
}

const FUNCTIONS: &[(&str, &str, MathFn)] = &[
    ("acos", "Return the arc cosine (measured in radians) of x.", acos),
    ("asin", "Return the arc sine (measured in radians) of x.", asin),
    ("atan", "Return the arc tangent (measured in radians) of x.", atan),
    ("atan2", "Return the arc tangent (measured in radians) of y/x.", atan2),
    ("ceil", "Return the ceiling of x as an Integral.", ceil),
    ("copysign", "Return a float with the magnitude of x but the sign of y.", copysign),
    ("cos", "Return the cosine of x (measured in radians).", cos),
    ("degrees", "Convert angle x from radians to degrees.", degrees),
    ("dist", "Return the Euclidean distance between two points p and q.", dist),
    ("fabs", "Return the absolute value of the float x.", fabs),
    ("factorial", "Find n!.", factorial),
    ("floor", "Return the floor of x as an Integral.", floor),
    ("fmod", "Return fmod(x, y), according to platform C.", fmod),
    ("fsum", "Return an accurate floating point sum of values in the iterable seq.", fsum),
    ("gcd", "Greatest Common Divisor.", gcd),
    ("hypot", "Multidimensional Euclidean distance from the origin to a point.", hypot),
    ("isclose", "Determine whether two floating point numbers are close in value.", isclose),
    ("isfinite", "Return True if x is neither an infinity nor a NaN, and False otherwise.", isfinite),
    ("isinf", "Return True if x is a positive or negative infinity, and False otherwise.", isinf),
    ("isnan", "Return True if x is a NaN (not a number), and False otherwise.", isnan),
    ("isqrt", "Return the integer part of the square root of the input.", isqrt),
    ("lcm", "Least Common Multiple.", lcm),
    ("log", "log(x, [base=math.e]) Return the logarithm of x to the given base.", log),
    ("log10", "Return the base 10 logarithm of x.", log10),
    ("log1p", "Return the natural logarithm of 1+x (base e).", log1p),
    ("log2", "Return the base 2 logarithm of x.", log2),
    ("modf", "Return the fractional and integer parts of x.", modf),
    ("radians", "Convert angle x from degrees to radians.", radians),
    ("remainder", "Difference between x and the closest integer multiple of y.", remainder),
    ("sin", "Return the sine of x (measured in radians).", sin),
    ("sqrt", "Return the square root of x.", sqrt),
    ("tan", "Return the tangent of x (measured in radians).", tan),
    ("trunc", "Truncates the Real x to the nearest Integral toward 0.", trunc),
    ("ulp", "Return the value of the least significant bit of the float x.", ulp),
];

pub fn module(session: &Session) -> ModuleValue {
    let mut builder = ModuleBuilder::new(
        "math",
        Some("This module provides access to the mathematical functions defined by the C standard."),
    );
    for &(name, doc, func) in FUNCTIONS {
        builder = builder.function(name, Some(doc), native(func));
    }
    builder
        .constant("pi", Value::Float(consts::PI))
        .constant("e", Value::Float(consts::E))
        .constant("tau", Value::Float(consts::TAU))
        .constant("inf", Value::Float(f64::INFINITY))
        .constant("nan", Value::Float(f64::NAN))
        .build(session.interner())
}
