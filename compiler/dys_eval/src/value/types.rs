//! Builtin type objects and hard-blocked builtins.

use super::Value;

/// A builtin type usable as a value (`int`, `list`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    Bool,
    Bytes,
    Dict,
    Float,
    FrozenSet,
    Int,
    List,
    Range,
    Set,
    Slice,
    Str,
    Tuple,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 12] = [
        BuiltinType::Bool,
        BuiltinType::Bytes,
        BuiltinType::Dict,
        BuiltinType::Float,
        BuiltinType::FrozenSet,
        BuiltinType::Int,
        BuiltinType::List,
        BuiltinType::Range,
        BuiltinType::Set,
        BuiltinType::Slice,
        BuiltinType::Str,
        BuiltinType::Tuple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Bool => "bool",
            BuiltinType::Bytes => "bytes",
            BuiltinType::Dict => "dict",
            BuiltinType::Float => "float",
            BuiltinType::FrozenSet => "frozenset",
            BuiltinType::Int => "int",
            BuiltinType::List => "list",
            BuiltinType::Range => "range",
            BuiltinType::Set => "set",
            BuiltinType::Slice => "slice",
            BuiltinType::Str => "str",
            BuiltinType::Tuple => "tuple",
        }
    }

    /// The builtin type of a value, if it has one.
    pub fn of(value: &Value) -> Option<BuiltinType> {
        Some(match value {
            Value::Bool(_) => BuiltinType::Bool,
            Value::Bytes(_) => BuiltinType::Bytes,
            Value::Dict(_) => BuiltinType::Dict,
            Value::Float(_) => BuiltinType::Float,
            Value::FrozenSet(_) => BuiltinType::FrozenSet,
            Value::Int(_) => BuiltinType::Int,
            Value::List(_) => BuiltinType::List,
            Value::Range(_) => BuiltinType::Range,
            Value::Set(_) => BuiltinType::Set,
            Value::Slice(_) => BuiltinType::Slice,
            Value::Str(_) => BuiltinType::Str,
            Value::Tuple(_) => BuiltinType::Tuple,
            _ => return None,
        })
    }

    /// `isinstance(value, self)`; `bool` counts as an `int`.
    pub fn contains(self, value: &Value) -> bool {
        match (self, value) {
            (BuiltinType::Int, Value::Bool(_)) => true,
            _ => BuiltinType::of(value) == Some(self),
        }
    }
}

/// Builtins that are never callable from a script.
///
/// Referencing one of these names raises a dangerous-value error as soon as
/// the name is evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockedBuiltin {
    Compile,
    Eval,
    Exec,
    Format,
    GetAttr,
    Help,
    Open,
    Repr,
    SetAttr,
    Type,
    Vars,
}

impl BlockedBuiltin {
    pub const ALL: [BlockedBuiltin; 11] = [
        BlockedBuiltin::Compile,
        BlockedBuiltin::Eval,
        BlockedBuiltin::Exec,
        BlockedBuiltin::Format,
        BlockedBuiltin::GetAttr,
        BlockedBuiltin::Help,
        BlockedBuiltin::Open,
        BlockedBuiltin::Repr,
        BlockedBuiltin::SetAttr,
        BlockedBuiltin::Type,
        BlockedBuiltin::Vars,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockedBuiltin::Compile => "compile",
            BlockedBuiltin::Eval => "eval",
            BlockedBuiltin::Exec => "exec",
            BlockedBuiltin::Format => "format",
            BlockedBuiltin::GetAttr => "getattr",
            BlockedBuiltin::Help => "help",
            BlockedBuiltin::Open => "open",
            BlockedBuiltin::Repr => "repr",
            BlockedBuiltin::SetAttr => "setattr",
            BlockedBuiltin::Type => "type",
            BlockedBuiltin::Vars => "vars",
        }
    }
}
