//! Runtime values.
//!
//! Scalars are stored inline; strings, bytes and tuples are immutable shared
//! slices; lists, dicts and sets are shared mutable cells so that aliasing
//! behaves like Python (`b = a; b.append(1)` changes `a`).

mod callable;
mod exception;
mod hash;
mod repr;
mod types;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use dys_ir::Name;

pub use callable::{
    BoundMethod, ClassValue, FunctionBody, Instance, Method, NativeFunction, ParamSlot,
    PrimitiveMethod, ScriptFunction, Signature,
};
pub use exception::{ExcType, ExceptionValue};
pub use hash::{Dict, HashKey, ValueSet};
pub use repr::{ascii_repr, format_float, repr_bytes, repr_str};
pub use types::{BlockedBuiltin, BuiltinType};

/// Insertion-ordered map with the fast non-cryptographic hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type DictRef = Rc<RefCell<Dict>>;
pub type SetRef = Rc<RefCell<ValueSet>>;

/// `range(start, stop, step)`; `step` is never zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let (lo, hi, step) = if self.step > 0 {
            (i128::from(self.start), i128::from(self.stop), i128::from(self.step))
        } else {
            (i128::from(self.stop), i128::from(self.start), -i128::from(self.step))
        };
        if hi <= lo {
            return 0;
        }
        usize::try_from((hi - lo + step - 1) / step).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, which must be below `len()`.
    pub fn nth(&self, index: usize) -> i64 {
        let offset = i128::try_from(index).unwrap_or(i128::MAX);
        let value = i128::from(self.start) + offset * i128::from(self.step);
        i64::try_from(value).unwrap_or(self.stop)
    }

    pub fn contains(&self, value: i64) -> bool {
        let in_bounds = if self.step > 0 {
            self.start <= value && value < self.stop
        } else {
            self.stop < value && value <= self.start
        };
        in_bounds && (i128::from(value) - i128::from(self.start)) % i128::from(self.step) == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> {
        let range = *self;
        (0..range.len()).map(move |i| range.nth(i))
    }
}

/// `slice(lower, upper, step)` with unevaluated-`None` bounds.
#[derive(Clone, Debug)]
pub struct SliceValue {
    pub lower: Value,
    pub upper: Value,
    pub step: Value,
}

/// An importable module, or a native object built the same way.
#[derive(Debug)]
pub struct ModuleValue {
    pub name: Rc<str>,
    pub members: FxIndexMap<Name, Value>,
    pub doc: Option<Rc<str>>,
    /// Has a native `__call__` member.
    pub callable: bool,
    /// Set on native objects, which print as values rather than modules.
    pub form: Option<ObjectForm>,
}

/// `repr` and `str` of a native object.
#[derive(Clone, Debug)]
pub struct ObjectForm {
    pub repr: Rc<str>,
    pub text: Rc<str>,
}

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    List(ListRef),
    Tuple(Rc<[Value]>),
    Dict(DictRef),
    Set(SetRef),
    FrozenSet(Rc<ValueSet>),
    Range(RangeValue),
    Slice(Rc<SliceValue>),
    Ellipsis,
    Function(Rc<ScriptFunction>),
    Native(Rc<NativeFunction>),
    BoundMethod(Rc<BoundMethod>),
    /// `classmethod(f)`: binds the class instead of the instance.
    ClassMethod(Rc<Value>),
    Type(BuiltinType),
    ExceptionType(ExcType),
    Class(Rc<ClassValue>),
    Instance(Rc<Instance>),
    Exception(Rc<ExceptionValue>),
    Module(Rc<ModuleValue>),
    Blocked(BlockedBuiltin),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn string(s: String) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn bytes(b: &[u8]) -> Value {
        Value::Bytes(Rc::from(b))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::from(items))
    }

    pub fn dict(dict: Dict) -> Value {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn set(set: ValueSet) -> Value {
        Value::Set(Rc::new(RefCell::new(set)))
    }

    pub fn exception(exc: ExceptionValue) -> Value {
        Value::Exception(Rc::new(exc))
    }

    /// Type name as shown in error messages.
    pub fn type_name(&self) -> Rc<str> {
        Rc::from(match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Range(_) => "range",
            Value::Slice(_) => "slice",
            Value::Ellipsis => "ellipsis",
            Value::Function(_) => "function",
            Value::Native(_) | Value::Blocked(_) => "builtin_function_or_method",
            Value::BoundMethod(_) => "method",
            Value::ClassMethod(_) => "classmethod",
            Value::Type(_) | Value::ExceptionType(_) | Value::Class(_) => "type",
            Value::Module(m) if m.form.is_some() => {
                let short = m.name.rsplit('.').next().unwrap_or(&m.name);
                return Rc::from(short);
            }
            Value::Module(_) => "module",
            Value::Instance(instance) => return Rc::clone(&instance.class.name),
            Value::Exception(exc) => return exc.class_name(),
        })
    }

    /// Truth value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::FrozenSet(s) => !s.is_empty(),
            Value::Range(r) => !r.is_empty(),
            _ => true,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Whether calling this value can succeed.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Native(_)
                | Value::BoundMethod(_)
                | Value::Type(_)
                | Value::ExceptionType(_)
                | Value::Class(_)
                | Value::Blocked(_)
        ) || matches!(self, Value::Module(m) if m.callable)
    }

    /// `len(value)` for sized values.
    pub fn len(&self) -> Option<usize> {
        Some(match self {
            Value::Str(s) => s.chars().count(),
            Value::Bytes(b) => b.len(),
            Value::List(l) => l.borrow().len(),
            Value::Tuple(t) => t.len(),
            Value::Dict(d) => d.borrow().len(),
            Value::Set(s) => s.borrow().len(),
            Value::FrozenSet(s) => s.len(),
            Value::Range(r) => r.len(),
            _ => return None,
        })
    }

    /// Integer view of `int` and `bool`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of any real number.
    #[allow(clippy::cast_precision_loss, reason = "int to float follows Python")]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `a is b`.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) | (Value::Ellipsis, Value::Ellipsis) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b) || (a.is_empty() && b.is_empty()),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::FrozenSet(a), Value::FrozenSet(b)) => Rc::ptr_eq(a, b),
            (Value::Slice(a), Value::Slice(b)) => Rc::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::ClassMethod(a), Value::ClassMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Blocked(a), Value::Blocked(b)) => a == b,
            _ => false,
        }
    }

    /// `a == b`.
    pub fn py_eq(&self, other: &Value) -> bool {
        eq_nested(self, other, 0)
    }

    /// Docstring of a callable, class or module.
    pub fn doc(&self) -> Option<Rc<str>> {
        match self {
            Value::Function(f) => f.doc.clone(),
            Value::Native(f) => f.doc.clone(),
            Value::Class(c) => c.doc.clone(),
            Value::Module(m) => m.doc.clone(),
            Value::BoundMethod(m) => match &m.method {
                Method::Callable(callable) => callable.doc(),
                Method::Primitive(_) => None,
            },
            Value::ClassMethod(inner) => inner.doc(),
            Value::Instance(i) => i.class.doc.clone(),
            _ => None,
        }
    }
}

/// Nesting beyond this compares unequal instead of recursing further.
const MAX_EQ_DEPTH: usize = 256;

fn eq_nested(a: &Value, b: &Value, depth: usize) -> bool {
    if depth > MAX_EQ_DEPTH {
        return false;
    }
    let seq_eq = |x: &[Value], y: &[Value]| {
        x.len() == y.len()
            && x.iter()
                .zip(y)
                .all(|(l, r)| l.is_same(r) || eq_nested(l, r, depth + 1))
    };
    match (a, b) {
        (Value::Float(_) | Value::Int(_) | Value::Bool(_), Value::Float(_))
        | (Value::Float(_), Value::Int(_) | Value::Bool(_)) => a.as_float() == b.as_float(),
        (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            a.as_int() == b.as_int()
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y) || seq_eq(&x.borrow(), &y.borrow()),
        (Value::Tuple(x), Value::Tuple(y)) => seq_eq(x, y),
        (Value::Dict(x), Value::Dict(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(k, v)| match y.get(k) {
                    Ok(Some(other)) => v.is_same(&other) || eq_nested(v, &other, depth + 1),
                    _ => false,
                })
        }
        (Value::Set(_) | Value::FrozenSet(_), Value::Set(_) | Value::FrozenSet(_)) => {
            with_set(a, |x| with_set(b, |y| x.len() == y.len() && x.is_subset(y)))
        }
        (Value::Range(x), Value::Range(y)) => {
            let (lx, ly) = (x.len(), y.len());
            lx == ly && (lx == 0 || (x.start == y.start && (lx == 1 || x.step == y.step)))
        }
        (Value::Slice(x), Value::Slice(y)) => {
            eq_nested(&x.lower, &y.lower, depth + 1)
                && eq_nested(&x.upper, &y.upper, depth + 1)
                && eq_nested(&x.step, &y.step, depth + 1)
        }
        _ => a.is_same(b),
    }
}

/// Run `f` on the set inside a `set` or `frozenset` value.
///
/// Callers only pass set values; anything else sees an empty set.
pub fn with_set<R>(value: &Value, f: impl FnOnce(&ValueSet) -> R) -> R {
    match value {
        Value::Set(s) => f(&s.borrow()),
        Value::FrozenSet(s) => f(s),
        _ => f(&ValueSet::new()),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}
