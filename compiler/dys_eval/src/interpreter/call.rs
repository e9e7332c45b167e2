//! Calls: argument evaluation, binding and dispatch on the callee.

use std::mem;
use std::rc::Rc;
use std::sync::Arc;

use dys_ir::{ExprId, ExprKind, Keyword, Name, Program, StmtKind};

use super::Interpreter;
use crate::errors::{
    dangerous, not_callable, resource, type_error, EvalResult, ResourceKind,
};
use crate::iter::collect;
use crate::native::CallArgs;
use crate::scope::new_layer;
use crate::value::{
    ClassValue, Dict, ExceptionValue, FunctionBody, FxIndexMap, Instance, Method, ScriptFunction,
    Signature, Value,
};

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// `'a'`, `'a' and 'b'`, `'a', 'b', and 'c'`.
fn quoted_list(names: &[Arc<str>]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn too_many_positional(name: &str, signature: &Signature, given: usize) -> String {
    let total = signature.positional_count();
    let required = signature
        .positional()
        .filter(|slot| slot.default.is_none())
        .count();
    let takes = if required == total {
        format!("{total} positional argument{}", plural(total))
    } else {
        format!("from {required} to {total} positional arguments")
    };
    let was = if given == 1 { "was" } else { "were" };
    format!("{name}() takes {takes} but {given} {was} given")
}

impl Interpreter<'_> {
    /// `func(*args, **keywords)` as written in the program.
    pub(super) fn eval_call(
        &mut self,
        program: &Program,
        func: ExprId,
        args: &[ExprId],
        keywords: &[Keyword],
    ) -> EvalResult {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(resource(ResourceKind::CallDepth, "Sorry, stack is to large"));
        }
        let callee = self.eval_expr(func)?;
        if !callee.is_callable() {
            return Err(not_callable(callee.type_name()));
        }

        let mut call_args = CallArgs::default();
        for &arg in args {
            if let ExprKind::Starred(inner) = &program.arena.expr(arg).kind {
                let value = self.eval_expr(*inner)?;
                call_args.positional.extend(collect(&value, &self.limits)?);
            } else {
                call_args.positional.push(self.eval_expr(arg)?);
            }
        }
        for keyword in keywords {
            let value = self.eval_expr(keyword.value)?;
            match keyword.arg {
                Some(name) => call_args.keywords.push((self.name_str(name), value)),
                None => {
                    let Value::Dict(mapping) = &value else {
                        return Err(type_error(format!(
                            "argument after ** must be a mapping, not {}",
                            value.type_name()
                        )));
                    };
                    for (key, item) in mapping.borrow().iter() {
                        let Some(key) = key.as_str() else {
                            return Err(type_error("keywords must be strings"));
                        };
                        call_args.keywords.push((Arc::from(key), item.clone()));
                    }
                }
            }
        }
        self.call_value(&callee, call_args)
    }

    /// Call any callable value.
    pub(crate) fn call_value(&mut self, callee: &Value, args: CallArgs) -> EvalResult {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(resource(ResourceKind::CallDepth, "Sorry, stack is to large"));
        }
        self.call_depth += 1;
        let result = self.dispatch_call(callee, args);
        self.call_depth -= 1;
        result
    }

    fn dispatch_call(&mut self, callee: &Value, mut args: CallArgs) -> EvalResult {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::Native(native) => {
                let func = Rc::clone(&native.func);
                func(self, args)
            }
            Value::BoundMethod(bound) => match &bound.method {
                Method::Primitive(method) => {
                    crate::builtins::methods::call(self, &bound.receiver, *method, args)
                }
                Method::Callable(inner) => {
                    args.positional.insert(0, bound.receiver.clone());
                    self.dispatch_call(inner, args)
                }
            },
            Value::Type(ty) => crate::builtins::convert::construct(self, *ty, args),
            Value::ExceptionType(ty) => {
                args.no_keywords(ty.name())?;
                Ok(Value::exception(ExceptionValue::new(*ty, args.positional)))
            }
            Value::Class(class) => self.instantiate(class, args),
            Value::Module(_) => match self.object_method(callee, "__call__") {
                Some(constructor) => self.dispatch_call(&constructor, args),
                None => Err(not_callable(callee.type_name())),
            },
            Value::Blocked(blocked) => Err(dangerous(format!(
                "This function is forbidden: builtins.{}",
                blocked.name()
            ))),
            other => Err(not_callable(other.type_name())),
        }
    }

    /// `Class(*args)`: build the instance, then run `__init__`.
    fn instantiate(&mut self, class: &Rc<ClassValue>, args: CallArgs) -> EvalResult {
        let instance = match class.exc_base {
            Some(ty) => Value::exception(ExceptionValue::with_class(
                Rc::clone(class),
                ty,
                args.positional.clone(),
            )),
            None => Value::Instance(Rc::new(Instance::new(Rc::clone(class)))),
        };
        match class.lookup(self.names.init) {
            Some(init) => {
                let mut args = args;
                args.positional.insert(0, instance.clone());
                let returned = self.call_value(&init, args)?;
                if !returned.is_none() {
                    return Err(type_error(format!(
                        "__init__() should return None, not '{}'",
                        returned.type_name()
                    )));
                }
            }
            None if class.exc_base.is_none() && !args.is_empty() => {
                return Err(type_error(format!("{}() takes no arguments", class.name)));
            }
            None => {}
        }
        Ok(instance)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(function = %func.name))]
    fn call_function(&mut self, func: &Rc<ScriptFunction>, args: CallArgs) -> EvalResult {
        let locals = self.bind_arguments(func, args)?;
        let layer = new_layer();
        layer.borrow_mut().extend(locals);
        let mut scope = func.closure.snapshot();
        scope.push_layer(layer);

        let saved_scope = mem::replace(&mut self.scope, scope);
        let saved_program = mem::replace(&mut self.program, func.program.clone());
        let program = func.program.clone();
        let result = match func.body {
            FunctionBody::Def(stmt) => match &program.arena.stmt(stmt).kind {
                StmtKind::FunctionDef(def) => match self.exec_block(&def.body) {
                    Ok(_) => Ok(Value::None),
                    Err(crate::errors::ControlAction::Return(value)) => Ok(value),
                    Err(signal) => Err(signal.into_error()),
                },
                _ => Ok(Value::None),
            },
            FunctionBody::Lambda(body) => self.eval_expr(body),
        };
        self.program = saved_program;
        self.scope = saved_scope;
        result
    }

    /// Match call arguments to a script function's parameters.
    fn bind_arguments(
        &self,
        func: &ScriptFunction,
        args: CallArgs,
    ) -> EvalResult<FxIndexMap<Name, Value>> {
        let signature = &func.signature;
        let name = &func.name;
        let interner = self.session.interner();
        let mut bound: FxIndexMap<Name, Value> = FxIndexMap::default();

        let given = args.positional.len();
        let mut positional = args.positional.into_iter();
        for (slot, value) in signature.positional().zip(positional.by_ref()) {
            bound.insert(slot.name, value);
        }
        let extra: Vec<Value> = positional.collect();
        match signature.vararg {
            Some(vararg) => {
                bound.insert(vararg, Value::tuple(extra));
            }
            None if !extra.is_empty() => {
                return Err(type_error(too_many_positional(name, signature, given)));
            }
            None => {}
        }

        let mut kwargs = Dict::new();
        let mut positional_only = Vec::new();
        for (key, value) in args.keywords {
            let slot = interner.get(&key).filter(|n| {
                signature
                    .args
                    .iter()
                    .chain(&signature.kwonly)
                    .any(|slot| slot.name == *n)
            });
            if let Some(slot) = slot {
                if bound.contains_key(&slot) {
                    return Err(type_error(format!(
                        "{name}() got multiple values for argument '{key}'"
                    )));
                }
                bound.insert(slot, value);
                continue;
            }
            if signature.kwarg.is_some() {
                let key = Value::str(&key);
                if kwargs.get(&key)?.is_some() {
                    return Err(type_error(format!(
                        "{name}() got multiple values for keyword argument '{}'",
                        key.to_str()
                    )));
                }
                kwargs.insert(key, value)?;
            } else if interner
                .get(&key)
                .is_some_and(|n| signature.posonly.iter().any(|slot| slot.name == n))
            {
                positional_only.push(key);
            } else {
                return Err(type_error(format!(
                    "{name}() got an unexpected keyword argument '{key}'"
                )));
            }
        }
        if !positional_only.is_empty() {
            return Err(type_error(format!(
                "{name}() got some positional-only arguments passed as keyword arguments: '{}'",
                positional_only.join(", ")
            )));
        }

        let mut missing = Vec::new();
        for slot in signature.positional() {
            if bound.contains_key(&slot.name) {
                continue;
            }
            match &slot.default {
                Some(default) => {
                    bound.insert(slot.name, default.clone());
                }
                None => missing.push(interner.lookup(slot.name)),
            }
        }
        if !missing.is_empty() {
            return Err(type_error(format!(
                "{name}() missing {} required positional argument{}: {}",
                missing.len(),
                plural(missing.len()),
                quoted_list(&missing)
            )));
        }
        for slot in &signature.kwonly {
            if bound.contains_key(&slot.name) {
                continue;
            }
            match &slot.default {
                Some(default) => {
                    bound.insert(slot.name, default.clone());
                }
                None => missing.push(interner.lookup(slot.name)),
            }
        }
        if !missing.is_empty() {
            return Err(type_error(format!(
                "{name}() missing {} required keyword-only argument{}: {}",
                missing.len(),
                plural(missing.len()),
                quoted_list(&missing)
            )));
        }

        if let Some(kwarg) = signature.kwarg {
            bound.insert(kwarg, Value::dict(kwargs));
        }
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoted_lists_read_like_prose() {
        let names: Vec<Arc<str>> = ["a", "b", "c"].into_iter().map(Arc::from).collect();
        assert_eq!(quoted_list(&names[..1]), "'a'");
        assert_eq!(quoted_list(&names[..2]), "'a' and 'b'");
        assert_eq!(quoted_list(&names), "'a', 'b', and 'c'");
    }
}
