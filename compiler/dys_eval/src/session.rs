//! Interpreter sessions.
//!
//! A [`Session`] owns what outlives a single program: the string interner,
//! the capability whitelist, the builtins layer and the importable modules.
//! Every program loaded into an interpreter, including nested evaluations,
//! shares its session.

use std::cell::RefCell;
use std::rc::Rc;

use dys_ir::{SharedInterner, StringInterner};

use crate::builtins;
use crate::capabilities::{CapabilityId, CapabilitySet, NativeId};
use crate::native::NativeFn;
use crate::scope::{new_layer, Layer};
use crate::value::{FxIndexMap, ModuleValue, NativeFunction, ObjectForm, Value};

pub struct Session {
    interner: SharedInterner,
    capabilities: CapabilitySet,
    builtins: Layer,
    modules: RefCell<FxIndexMap<Rc<str>, Value>>,
}

impl Session {
    /// A session with the builtin catalog whitelisted and installed.
    pub fn new() -> Self {
        let interner = SharedInterner::new();
        let builtins = new_layer();
        builtins::install(&builtins, &interner);
        Session {
            interner,
            capabilities: CapabilitySet::seeded(),
            builtins,
            modules: RefCell::new(FxIndexMap::default()),
        }
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn shared_interner(&self) -> SharedInterner {
        self.interner.clone()
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn builtins(&self) -> &Layer {
        &self.builtins
    }

    /// Replace or add one builtin binding.
    pub fn set_builtin(&self, name: &str, value: Value) {
        if let Value::Native(f) = &value {
            self.capabilities.insert(f.capability());
        }
        self.builtins
            .borrow_mut()
            .insert(self.interner.intern(name), value);
    }

    /// Whitelist the functions of a module-like value built at run time
    /// without making it importable.
    pub fn adopt(&self, module: ModuleValue) -> Value {
        self.capabilities.extend(module_capabilities(&module));
        Value::Module(Rc::new(module))
    }

    /// Make a module importable and whitelist its functions.
    pub fn register_module(&self, module: ModuleValue) {
        self.capabilities.extend(module_capabilities(&module));
        let name = Rc::clone(&module.name);
        tracing::debug!(module = %name, members = module.members.len(), "registered module");
        self.modules
            .borrow_mut()
            .insert(name, Value::Module(Rc::new(module)));
    }

    pub fn module(&self, name: &str) -> Option<Value> {
        self.modules.borrow().get(name).cloned()
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> Vec<Value> {
        self.modules.borrow().values().cloned().collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Capabilities of every native function in `module`, submodules included.
fn module_capabilities(module: &ModuleValue) -> Vec<CapabilityId> {
    let mut ids = Vec::new();
    for value in module.members.values() {
        match value {
            Value::Native(f) => ids.push(f.capability()),
            Value::Module(sub) => ids.extend(module_capabilities(sub)),
            _ => {}
        }
    }
    ids
}

/// Builds a [`ModuleValue`] member by member.
pub struct ModuleBuilder {
    name: Rc<str>,
    doc: Option<Rc<str>>,
    members: Vec<(String, Value)>,
    form: Option<ObjectForm>,
}

impl ModuleBuilder {
    pub fn new(name: &str, doc: Option<&str>) -> Self {
        ModuleBuilder {
            name: Rc::from(name),
            doc: doc.map(Rc::from),
            members: Vec::new(),
            form: None,
        }
    }

    /// A native object of type `name` that prints as `repr` and `text`.
    pub fn object(name: &str, repr: impl Into<Rc<str>>, text: impl Into<Rc<str>>) -> Self {
        let mut builder = ModuleBuilder::new(name, None);
        builder.form = Some(ObjectForm {
            repr: repr.into(),
            text: text.into(),
        });
        builder
    }

    /// Add a native function; its capability id is `module.name`.
    #[must_use]
    pub fn function(mut self, name: &str, doc: Option<&str>, func: NativeFn) -> Self {
        let id = NativeId::new(&self.name, name);
        let value = Value::Native(Rc::new(NativeFunction::new(id, doc, func)));
        self.members.push((name.to_string(), value));
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.members.push((name.to_string(), value));
        self
    }

    pub fn build(self, interner: &StringInterner) -> ModuleValue {
        let callable = self
            .members
            .iter()
            .any(|(name, value)| name == "__call__" && matches!(value, Value::Native(_)));
        let members = self
            .members
            .into_iter()
            .map(|(name, value)| (interner.intern(&name), value))
            .collect();
        ModuleValue {
            name: self.name,
            members,
            doc: self.doc,
            callable,
            form: self.form,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::native;

    #[test]
    fn registering_a_module_whitelists_its_functions() {
        let session = Session::new();
        let module = ModuleBuilder::new("demo", Some("demo module"))
            .function("hello", None, native(|_, _| Ok(Value::None)))
            .constant("answer", Value::Int(42))
            .build(session.interner());
        session.register_module(module);

        let id = CapabilityId::Native(NativeId::new("demo", "hello"));
        assert!(session.capabilities().contains(&id));
        assert!(session.module("demo").is_some());
        assert!(session.module("missing").is_none());
    }

    #[test]
    fn set_builtin_rebinds_in_the_builtins_layer() {
        let session = Session::new();
        session.set_builtin("answer", Value::Int(42));
        let name = session.interner().intern("answer");
        assert!(session
            .builtins()
            .borrow()
            .get(&name)
            .is_some_and(|v| v.py_eq(&Value::Int(42))));
    }
}
