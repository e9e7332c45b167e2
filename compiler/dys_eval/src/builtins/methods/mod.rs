//! Methods of primitive types.
//!
//! Method names are resolved against fixed tables, so `"abc".upper` yields a
//! bound [`PrimitiveMethod`] whose capability is `str.upper`. Calling it
//! dispatches on the receiver's variant.

mod bytes;
mod dict;
mod list;
mod set;
mod string;

use crate::errors::{attribute_error, type_error, EvalResult};
use crate::interpreter::Interpreter;
use crate::native::CallArgs;
use crate::value::{BuiltinType, PrimitiveMethod, Value};

const STR_METHODS: &[&str] = &[
    "capitalize", "casefold", "center", "count", "encode", "endswith", "expandtabs", "find",
    "index", "isalnum", "isalpha", "isascii", "isdecimal", "isdigit", "islower", "isnumeric",
    "isspace", "istitle", "isupper", "join", "ljust", "lower", "lstrip", "partition",
    "removeprefix", "removesuffix", "replace", "rfind", "rindex", "rjust", "rpartition", "rsplit",
    "rstrip", "split", "splitlines", "startswith", "strip", "swapcase", "title", "upper", "zfill",
];

const BYTES_METHODS: &[&str] = &["decode", "hex"];

const LIST_METHODS: &[&str] = &[
    "append", "clear", "copy", "count", "extend", "index", "insert", "pop", "remove", "reverse",
    "sort",
];

const DICT_METHODS: &[&str] = &[
    "clear", "copy", "fromkeys", "get", "items", "keys", "pop", "popitem", "setdefault", "update",
    "values",
];

const SET_METHODS: &[&str] = &[
    "add", "clear", "copy", "discard", "remove", "pop", "union", "intersection", "difference",
    "issubset", "issuperset", "update",
];

const FROZENSET_METHODS: &[&str] = &[
    "copy", "union", "intersection", "difference", "issubset", "issuperset",
];

fn table(owner: BuiltinType) -> &'static [&'static str] {
    match owner {
        BuiltinType::Str => STR_METHODS,
        BuiltinType::Bytes => BYTES_METHODS,
        BuiltinType::List => LIST_METHODS,
        BuiltinType::Dict => DICT_METHODS,
        BuiltinType::Set => SET_METHODS,
        BuiltinType::FrozenSet => FROZENSET_METHODS,
        _ => &[],
    }
}

/// The method `name` of `owner`, if it has one.
pub(crate) fn lookup(owner: BuiltinType, name: &str) -> Option<PrimitiveMethod> {
    table(owner)
        .iter()
        .find(|m| **m == name)
        .map(|name| PrimitiveMethod { owner, name: *name })
}

/// Every primitive method, for the capability catalog.
pub(crate) fn all() -> impl Iterator<Item = PrimitiveMethod> {
    BuiltinType::ALL
        .into_iter()
        .flat_map(|owner| table(owner).iter().map(move |name| PrimitiveMethod { owner, name: *name }))
}

/// Call `method` on `receiver`.
///
/// A receiver that is the type object itself (`str.join`) takes the first
/// argument as the instance, except for `dict.fromkeys`.
pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    method: PrimitiveMethod,
    mut args: CallArgs,
) -> EvalResult {
    if let Value::Type(ty) = receiver {
        if *ty == BuiltinType::Dict && method.name == "fromkeys" {
            return dict::fromkeys(args);
        }
        if args.positional.is_empty() {
            return Err(type_error(format!(
                "unbound method {}.{}() needs an argument",
                ty.name(),
                method.name
            )));
        }
        let instance = args.positional.remove(0);
        if !ty.contains(&instance) {
            return Err(type_error(format!(
                "descriptor '{}' for '{}' objects doesn't apply to a '{}' object",
                method.name,
                ty.name(),
                instance.type_name()
            )));
        }
        return call(interp, &instance, method, args);
    }
    let name = method.name;
    match receiver {
        Value::Str(s) => string::call(interp, s, name, args),
        Value::Bytes(b) => bytes::call(b, name, args),
        Value::List(items) => list::call(interp, items, name, args),
        Value::Dict(dict) => dict::call(interp, dict, name, args),
        Value::Set(_) | Value::FrozenSet(_) => set::call(interp, receiver, name, args),
        other => Err(attribute_error(&other.type_name(), name)),
    }
}

#[cfg(test)]
mod tests;
