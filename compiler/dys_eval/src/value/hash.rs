//! Hashing of values, and the insertion-ordered `Dict` and `ValueSet`.
//!
//! Keys follow Python equality: `1`, `1.0` and `True` are
//! the same key. Mutable containers are unhashable; objects with identity
//! (functions, classes, instances) hash by address.

use std::rc::Rc;

use super::{FxIndexMap, Value};
use crate::errors::{unhashable, EvalError};

/// Hashable projection of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    None,
    Ellipsis,
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    Tuple(Box<[HashKey]>),
    FrozenSet(Box<[HashKey]>),
    Range(i64, i64, i64),
    Builtin(&'static str),
    Identity(usize),
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range checked before the cast; integral floats share int keys"
)]
fn float_key(f: f64) -> HashKey {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18 {
        return HashKey::Int(f as i64);
    }
    HashKey::Float(f.to_bits())
}

impl Value {
    /// Hash key of a value, or `TypeError: unhashable type`.
    pub fn hash_key(&self) -> Result<HashKey, EvalError> {
        Ok(match self {
            Value::None => HashKey::None,
            Value::Ellipsis => HashKey::Ellipsis,
            Value::Bool(b) => HashKey::Int(i64::from(*b)),
            Value::Int(i) => HashKey::Int(*i),
            Value::Float(f) => float_key(*f),
            Value::Str(s) => HashKey::Str(Rc::clone(s)),
            Value::Bytes(b) => HashKey::Bytes(Rc::clone(b)),
            Value::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(Value::hash_key)
                    .collect::<Result<Vec<_>, _>>()?
                    .into_boxed_slice(),
            ),
            Value::FrozenSet(set) => {
                let mut keys: Vec<HashKey> = set.keys().cloned().collect();
                keys.sort();
                HashKey::FrozenSet(keys.into_boxed_slice())
            }
            Value::Range(r) => HashKey::Range(r.start, r.stop, r.step),
            Value::Type(ty) => HashKey::Builtin(ty.name()),
            Value::ExceptionType(ty) => HashKey::Builtin(ty.name()),
            Value::Blocked(b) => HashKey::Builtin(b.name()),
            Value::Function(f) => HashKey::Identity(Rc::as_ptr(f) as usize),
            Value::Native(f) => HashKey::Identity(Rc::as_ptr(f) as usize),
            Value::Class(c) => HashKey::Identity(Rc::as_ptr(c) as usize),
            Value::Instance(i) => HashKey::Identity(Rc::as_ptr(i) as usize),
            Value::Exception(e) => HashKey::Identity(Rc::as_ptr(e) as usize),
            Value::Module(m) => HashKey::Identity(Rc::as_ptr(m) as usize),
            Value::BoundMethod(m) => HashKey::Identity(Rc::as_ptr(m) as usize),
            Value::ClassMethod(m) => HashKey::Identity(Rc::as_ptr(m) as usize),
            Value::List(_) | Value::Dict(_) | Value::Set(_) | Value::Slice(_) => {
                return Err(unhashable(self.type_name()))
            }
        })
    }
}

/// Insertion-ordered mapping with hashable keys.
#[derive(Clone, Debug, Default)]
pub struct Dict {
    entries: FxIndexMap<HashKey, (Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, EvalError> {
        Ok(self.get_by_key(&key.hash_key()?))
    }

    pub fn get_by_key(&self, key: &HashKey) -> Option<Value> {
        self.entries.get(key).map(|(_, v)| v.clone())
    }

    /// Look up a `str` key.
    pub fn get_str(&self, key: &str) -> Option<Value> {
        self.get_by_key(&HashKey::Str(Rc::from(key)))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, EvalError> {
        Ok(self.entries.contains_key(&key.hash_key()?))
    }

    /// Insert or update; an existing entry keeps its original key object.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), EvalError> {
        let hash = key.hash_key()?;
        match self.entries.get_mut(&hash) {
            Some(entry) => entry.1 = value,
            None => {
                self.entries.insert(hash, (key, value));
            }
        }
        Ok(())
    }

    pub fn insert_str(&mut self, key: &str, value: Value) {
        let key: Rc<str> = Rc::from(key);
        self.entries
            .insert(HashKey::Str(Rc::clone(&key)), (Value::Str(key), value));
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, EvalError> {
        Ok(self
            .entries
            .shift_remove(&key.hash_key()?)
            .map(|(_, value)| value))
    }

    pub fn pop_last(&mut self) -> Option<(Value, Value)> {
        self.entries.pop().map(|(_, entry)| entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

/// Insertion-ordered set of hashable values.
#[derive(Clone, Debug, Default)]
pub struct ValueSet {
    items: FxIndexMap<HashKey, Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        ValueSet::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Result<Self, EvalError> {
        let mut set = ValueSet::new();
        for value in values {
            set.insert(value)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns whether the value was newly added.
    pub fn insert(&mut self, value: Value) -> Result<bool, EvalError> {
        let key = value.hash_key()?;
        if self.items.contains_key(&key) {
            return Ok(false);
        }
        self.items.insert(key, value);
        Ok(true)
    }

    pub fn contains(&self, value: &Value) -> Result<bool, EvalError> {
        Ok(self.items.contains_key(&value.hash_key()?))
    }

    pub fn contains_key(&self, key: &HashKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn remove(&mut self, value: &Value) -> Result<bool, EvalError> {
        Ok(self.items.shift_remove(&value.hash_key()?).is_some())
    }

    pub fn pop_first(&mut self) -> Option<Value> {
        self.items.shift_remove_index(0).map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &HashKey> {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.values()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.values().cloned().collect()
    }

    pub fn is_subset(&self, other: &ValueSet) -> bool {
        self.items.keys().all(|k| other.items.contains_key(k))
    }

    pub fn union(&self, other: &ValueSet) -> ValueSet {
        let mut items = self.items.clone();
        for (k, v) in &other.items {
            if !items.contains_key(k) {
                items.insert(k.clone(), v.clone());
            }
        }
        ValueSet { items }
    }

    pub fn intersection(&self, other: &ValueSet) -> ValueSet {
        ValueSet {
            items: self
                .items
                .iter()
                .filter(|(k, _)| other.items.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn difference(&self, other: &ValueSet) -> ValueSet {
        ValueSet {
            items: self
                .items
                .iter()
                .filter(|(k, _)| !other.items.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn symmetric_difference(&self, other: &ValueSet) -> ValueSet {
        let mut result = self.difference(other);
        for (k, v) in &other.items {
            if !self.items.contains_key(k) {
                result.items.insert(k.clone(), v.clone());
            }
        }
        result
    }
}
