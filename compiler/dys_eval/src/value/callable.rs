//! Callable values: script functions, native functions, bound methods,
//! script classes and their instances.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dys_ir::{ExprId, Name, SharedProgram, StmtId};

use super::{BuiltinType, ExcType, FxIndexMap, Value};
use crate::capabilities::{CapabilityId, DefId, NativeId};
use crate::native::NativeFn;
use crate::scope::Scope;

/// One named parameter and its default, evaluated at definition time.
#[derive(Clone, Debug)]
pub struct ParamSlot {
    pub name: Name,
    pub default: Option<Value>,
}

/// Runtime signature of a script function.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    pub posonly: Vec<ParamSlot>,
    pub args: Vec<ParamSlot>,
    pub vararg: Option<Name>,
    pub kwonly: Vec<ParamSlot>,
    pub kwarg: Option<Name>,
}

impl Signature {
    /// Parameters that can be filled positionally.
    pub fn positional(&self) -> impl Iterator<Item = &ParamSlot> {
        self.posonly.iter().chain(self.args.iter())
    }

    pub fn positional_count(&self) -> usize {
        self.posonly.len() + self.args.len()
    }
}

/// Where a script function's body lives in its program.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionBody {
    /// A `def` statement; the body is its block.
    Def(StmtId),
    /// A `lambda`; the body is one expression.
    Lambda(ExprId),
}

/// A function or lambda defined by a script.
pub struct ScriptFunction {
    pub name: Rc<str>,
    pub def: DefId,
    pub program: SharedProgram,
    pub body: FunctionBody,
    pub signature: Signature,
    pub closure: Scope,
    pub annotations: FxIndexMap<Name, Value>,
    pub doc: Option<Rc<str>>,
}

impl ScriptFunction {
    pub fn capability(&self) -> CapabilityId {
        CapabilityId::Script(self.def.clone())
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.name)
            .field("def", &self.def)
            .finish_non_exhaustive()
    }
}

/// A function implemented in Rust: a builtin, a library module member or a
/// host capability.
pub struct NativeFunction {
    pub id: NativeId,
    pub doc: Option<Rc<str>>,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(id: NativeId, doc: Option<&str>, func: NativeFn) -> Self {
        NativeFunction {
            id,
            doc: doc.map(Rc::from),
            func,
        }
    }

    pub fn capability(&self) -> CapabilityId {
        CapabilityId::Native(self.id.clone())
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.id)
    }
}

/// A method of a primitive type, e.g. `str.join`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveMethod {
    pub owner: BuiltinType,
    pub name: &'static str,
}

/// What a bound method calls.
#[derive(Clone, Debug)]
pub enum Method {
    Primitive(PrimitiveMethod),
    Callable(Value),
}

/// A callable with its first argument already bound.
#[derive(Clone, Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Method,
}

/// A class defined by a script.
#[derive(Debug)]
pub struct ClassValue {
    pub name: Rc<str>,
    pub def: DefId,
    pub bases: Vec<Rc<ClassValue>>,
    /// Builtin exception class this class derives from, directly or through
    /// its bases.
    pub exc_base: Option<ExcType>,
    pub namespace: RefCell<FxIndexMap<Name, Value>>,
    pub doc: Option<Rc<str>>,
}

impl ClassValue {
    /// Look an attribute up on this class, then its bases depth first.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        if let Some(value) = self.namespace.borrow().get(&name) {
            return Some(value.clone());
        }
        self.bases.iter().find_map(|base| base.lookup(name))
    }

    /// `issubclass(self, other)` for two script classes.
    pub fn is_subclass_of(&self, other: &ClassValue) -> bool {
        std::ptr::eq(self, other) || self.bases.iter().any(|base| base.is_subclass_of(other))
    }

    pub fn capability(&self) -> CapabilityId {
        CapabilityId::Script(self.def.clone())
    }
}

/// An instance of a script class.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassValue>,
    pub attrs: RefCell<FxIndexMap<Name, Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassValue>) -> Self {
        Instance {
            class,
            attrs: RefCell::new(FxIndexMap::default()),
        }
    }
}
