//! The builtin catalog.
//!
//! Everything a fresh session whitelists and binds in its builtins layer:
//! native functions, type objects, exception classes, the methods of
//! primitive types, and the hard-blocked names.

pub(crate) mod convert;
pub(crate) mod functions;
pub(crate) mod methods;

use std::rc::Rc;

use dys_ir::StringInterner;

use crate::capabilities::{CapabilityId, NativeId};
use crate::errors::EvalResult;
use crate::interpreter::Interpreter;
use crate::native::{native, CallArgs};
use crate::scope::Layer;
use crate::value::{BlockedBuiltin, BuiltinType, ExcType, NativeFunction, Value};

type BuiltinFn = for<'i> fn(&mut Interpreter<'i>, CallArgs) -> EvalResult;

/// Native builtins: name, docstring, body.
const FUNCTIONS: &[(&str, &str, BuiltinFn)] = &[
    ("abs", "Return the absolute value of the argument.", functions::abs),
    ("all", "Return True if bool(x) is True for all values x in the iterable.", functions::all),
    ("any", "Return True if bool(x) is True for any x in the iterable.", functions::any),
    ("bin", "Return the binary representation of an integer.", functions::bin),
    ("callable", "Return whether the object is callable.", functions::callable),
    ("chr", "Return a one-character string of the given code point.", functions::chr),
    ("classmethod", "Convert a function to be a class method.", functions::classmethod),
    ("divmod", "Return the tuple (x//y, x%y).", functions::divmod),
    ("enumerate", "Return a list of (index, value) pairs.", functions::enumerate),
    ("filter", "Return the items of iterable for which function(item) is true.", functions::filter),
    ("hex", "Return the hexadecimal representation of an integer.", functions::hex),
    ("isinstance", "Return whether an object is an instance of a class.", functions::isinstance),
    ("issubclass", "Return whether a class is derived from another class.", functions::issubclass),
    ("iter", "Return the items of an iterable as a list.", functions::iter),
    ("len", "Return the number of items in a container.", functions::len),
    ("map", "Apply a function to every item of the iterables.", functions::map),
    ("max", "Return the largest item.", functions::max),
    ("min", "Return the smallest item.", functions::min),
    ("oct", "Return the octal representation of an integer.", functions::oct),
    ("ord", "Return the code point of a one-character string.", functions::ord),
    ("pow", "Equivalent to base**exp.", functions::pow),
    ("print", "Print the values, separated by sep and followed by end.", functions::print),
    ("reversed", "Return the items of a sequence in reverse order.", functions::reversed),
    ("round", "Round a number to a given precision in decimal digits.", functions::round),
    ("sorted", "Return a new sorted list from the items of an iterable.", functions::sorted),
    ("sum", "Return the sum of a start value plus an iterable of numbers.", functions::sum),
    ("zip", "Return a list of tuples pairing up items of the iterables.", functions::zip),
];

/// Every capability a new session starts with.
pub fn catalog() -> Vec<CapabilityId> {
    let mut ids: Vec<CapabilityId> = FUNCTIONS
        .iter()
        .map(|(name, _, _)| CapabilityId::Native(NativeId::builtin(name)))
        .collect();
    ids.extend(BuiltinType::ALL.into_iter().map(CapabilityId::Type));
    ids.extend(ExcType::BUILTINS.into_iter().map(CapabilityId::Exception));
    ids.push(CapabilityId::Exception(ExcType::JsonDecodeError));
    ids.extend(methods::all().map(|m| CapabilityId::Method {
        owner: m.owner,
        name: m.name,
    }));
    ids
}

/// Bind the catalog in `layer`.
pub fn install(layer: &Layer, interner: &StringInterner) {
    let mut layer = layer.borrow_mut();
    for &(name, doc, func) in FUNCTIONS {
        let value = NativeFunction::new(NativeId::builtin(name), Some(doc), native(func));
        layer.insert(interner.intern(name), Value::Native(Rc::new(value)));
    }
    for ty in BuiltinType::ALL {
        layer.insert(interner.intern(ty.name()), Value::Type(ty));
    }
    for ty in ExcType::BUILTINS {
        layer.insert(interner.intern(ty.name()), Value::ExceptionType(ty));
    }
    for blocked in BlockedBuiltin::ALL {
        layer.insert(interner.intern(blocked.name()), Value::Blocked(blocked));
    }
}

/// A `help` that returns the argument's docstring instead of paging.
pub fn safe_help() -> Value {
    let func = native(|_, args| {
        args.arity("help", 1, 1)?;
        Ok(args.arg(0).doc().map_or(Value::None, |doc| Value::str(&doc)))
    });
    Value::Native(Rc::new(NativeFunction::new(
        NativeId::builtin("help"),
        Some("Return the docstring of an object."),
        func,
    )))
}

#[cfg(test)]
mod tests;
