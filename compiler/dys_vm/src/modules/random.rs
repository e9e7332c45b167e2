//! `random`: a deterministic generator.
//!
//! Every invocation seeds the generator from its inputs, so replays of a
//! transaction draw the same numbers. `seed()` reseeds from the repr of
//! its argument and refuses `None`, which would mean "seed from the clock".

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha3::{Digest, Sha3_256};

use dys_eval::errors::{exception, index_error, type_error, value_error};
use dys_eval::{native, CallArgs, EvalResult, ExcType, ModuleBuilder, ModuleValue, NativeFn, Session, Value};

pub type SharedRng = Rc<RefCell<StdRng>>;

pub fn seeded(seed: [u8; 32]) -> SharedRng {
    Rc::new(RefCell::new(StdRng::from_seed(seed)))
}

fn real(value: &Value, name: &str) -> EvalResult<f64> {
    value.as_float().ok_or_else(|| {
        type_error(format!("{name} must be a real number, not {}", value.type_name()))
    })
}

fn int(value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn bind(rng: &SharedRng, f: fn(&mut StdRng, CallArgs) -> EvalResult) -> NativeFn {
    let rng = Rc::clone(rng);
    native(move |_, args| f(&mut rng.borrow_mut(), args))
}

fn random(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("random", 0, 0)?;
    Ok(Value::Float(rng.gen::<f64>()))
}

fn uniform(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("uniform", 2, 2)?;
    let (a, b) = (real(&args.arg(0), "a")?, real(&args.arg(1), "b")?);
    Ok(Value::Float(a + (b - a) * rng.gen::<f64>()))
}

/// `randrange(start, stop, step)` after argument defaults are applied.
fn draw_range(rng: &mut StdRng, start: i64, stop: i64, step: i64) -> EvalResult {
    if step == 0 {
        return Err(value_error("zero step for randrange()"));
    }
    let span = i128::from(stop) - i128::from(start);
    let step128 = i128::from(step);
    let count = if step > 0 {
        (span + step128 - 1).div_euclid(step128)
    } else {
        (span + step128 + 1).div_euclid(step128)
    };
    if count <= 0 {
        return Err(value_error(format!(
            "empty range for randrange() ({start}, {stop}, {step})"
        )));
    }
    let pick = rng.gen_range(0..count);
    i64::try_from(i128::from(start) + pick * step128)
        .map(Value::Int)
        .map_err(|_| value_error("randrange() result out of range"))
}

fn randrange(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("randrange", 1, 3)?;
    let (start, stop) = match args.get(1) {
        None => (0, int(&args.arg(0))?),
        Some(stop) => (int(&args.arg(0))?, int(stop)?),
    };
    let step = args.get(2).map_or(Ok(1), int)?;
    draw_range(rng, start, stop, step)
}

fn randint(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("randint", 2, 2)?;
    let (a, b) = (int(&args.arg(0))?, int(&args.arg(1))?);
    draw_range(rng, a, b.saturating_add(1), 1)
}

fn choice(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("choice", 1, 1)?;
    let items: Vec<Value> = match args.arg(0) {
        Value::List(items) => items.borrow().clone(),
        Value::Tuple(items) => items.to_vec(),
        Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
        Value::Range(range) => {
            if range.is_empty() {
                return Err(index_error("Cannot choose from an empty sequence"));
            }
            let i = rng.gen_range(0..range.len());
            return Ok(Value::Int(range.nth(i)));
        }
        other => {
            return Err(type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )))
        }
    };
    items
        .choose(rng)
        .cloned()
        .ok_or_else(|| index_error("Cannot choose from an empty sequence"))
}

fn shuffle(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("shuffle", 1, 1)?;
    match args.arg(0) {
        Value::List(items) => {
            items.borrow_mut().shuffle(rng);
            Ok(Value::None)
        }
        other => Err(type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Normal variate by the Box-Muller transform.
fn gauss(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("gauss", 0, 2)?;
    let mu = args.get(0).map_or(Ok(0.0), |v| real(v, "mu"))?;
    let sigma = args.get(1).map_or(Ok(1.0), |v| real(v, "sigma"))?;
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    Ok(Value::Float(mu + z * sigma))
}

fn expovariate(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("expovariate", 0, 1)?;
    let lambd = args.get(0).map_or(Ok(1.0), |v| real(v, "lambd"))?;
    if lambd == 0.0 {
        return Err(exception(ExcType::ZeroDivisionError, "float division by zero"));
    }
    Ok(Value::Float(-(1.0 - rng.gen::<f64>()).ln() / lambd))
}

fn paretovariate(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("paretovariate", 1, 1)?;
    let alpha = real(&args.arg(0), "alpha")?;
    if alpha == 0.0 {
        return Err(exception(ExcType::ZeroDivisionError, "float division by zero"));
    }
    let u = 1.0 - rng.gen::<f64>();
    Ok(Value::Float(u.powf(-1.0 / alpha)))
}

fn triangular(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("triangular", 0, 3)?;
    let mut low = args.get(0).map_or(Ok(0.0), |v| real(v, "low"))?;
    let mut high = args.get(1).map_or(Ok(1.0), |v| real(v, "high"))?;
    if high == low {
        return Ok(Value::Float(low));
    }
    let mut c = match args.get(2) {
        None | Some(Value::None) => 0.5,
        Some(mode) => (real(mode, "mode")? - low) / (high - low),
    };
    let mut u = rng.gen::<f64>();
    if u > c {
        u = 1.0 - u;
        c = 1.0 - c;
        std::mem::swap(&mut low, &mut high);
    }
    Ok(Value::Float(low + (high - low) * (u * c).sqrt()))
}

fn seed(rng: &mut StdRng, args: CallArgs) -> EvalResult {
    args.arity("seed", 0, 2)?;
    let a = args.arg(0);
    if a.is_none() {
        return Err(exception(ExcType::AssertionError, "in Dyson seed must not be None"));
    }
    let digest: [u8; 32] = Sha3_256::digest(a.repr().as_bytes()).into();
    *rng = StdRng::from_seed(digest);
    Ok(Value::None)
}

type RandomFn = fn(&mut StdRng, CallArgs) -> EvalResult;

const FUNCTIONS: &[(&str, &str, RandomFn)] = &[
    ("choice", "Choose a random element from a non-empty sequence.", choice),
    ("expovariate", "Exponential distribution.", expovariate),
    ("gauss", "Gaussian distribution.", gauss),
    ("paretovariate", "Pareto distribution.  alpha is the shape parameter.", paretovariate),
    ("randint", "Return random integer in range [a, b], including both end points.", randint),
    ("random", "random() -> x in the interval [0, 1).", random),
    ("randrange", "Choose a random item from range(start, stop[, step]).", randrange),
    ("seed", "Initialize internal state from a seed.", seed),
    ("shuffle", "Shuffle list x in place, and return None.", shuffle),
    ("triangular", "Triangular distribution.", triangular),
    ("uniform", "Get a random number in the range [a, b) or [a, b] depending on rounding.", uniform),
];

pub fn module(session: &Session, rng: &SharedRng) -> ModuleValue {
    let mut builder = ModuleBuilder::new(
        "random",
        Some("Random variable generators, seeded from the invocation."),
    );
    for &(name, doc, func) in FUNCTIONS {
        builder = builder.function(name, Some(doc), bind(rng, func));
    }
    builder.build(session.interner())
}
