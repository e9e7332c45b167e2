//! Attribute access.
//!
//! Names starting with `_` are refused before the object is even evaluated.
//! Everything else is checked against the member deny list, then resolved
//! per value kind: instance attributes before class attributes, module
//! members, and the methods of primitive types.

use std::rc::Rc;

use dys_ir::{ExprId, Name};

use super::Interpreter;
use crate::builtins::methods;
use crate::capabilities::check_attribute;
use crate::errors::{attribute_error, exception, EvalResult};
use crate::value::{BoundMethod, BuiltinType, ExcType, Method, Value};

/// Type name the deny list is keyed by; classes are all `type`.
fn owner_name(value: &Value) -> Rc<str> {
    match value {
        Value::Class(_) | Value::Type(_) | Value::ExceptionType(_) => Rc::from("type"),
        other => other.type_name(),
    }
}

/// Bind a class attribute to the object it was looked up through.
fn bind(value: Value, receiver: &Value, class: Value) -> Value {
    match value {
        Value::Function(_) => Value::BoundMethod(Rc::new(BoundMethod {
            receiver: receiver.clone(),
            method: Method::Callable(value),
        })),
        Value::ClassMethod(inner) => Value::BoundMethod(Rc::new(BoundMethod {
            receiver: class,
            method: Method::Callable((*inner).clone()),
        })),
        other => other,
    }
}

fn no_type_attribute(type_name: &str, attr: &str) -> crate::errors::EvalError {
    exception(
        ExcType::AttributeError,
        format!("type object '{type_name}' has no attribute '{attr}'"),
    )
}

impl Interpreter<'_> {
    /// `value.attr` as written in the program.
    pub(super) fn load_attribute(&mut self, value: ExprId, attr: Name) -> EvalResult {
        let attr_str = self.name_str(attr);
        if attr_str.starts_with('_') {
            check_attribute("", &attr_str)?;
        }
        let object = self.eval_expr(value)?;
        self.get_attribute(&object, attr)
    }

    /// `getattr(object, attr)` with every access check applied.
    pub(crate) fn get_attribute(&self, object: &Value, attr: Name) -> EvalResult {
        let attr_str = self.name_str(attr);
        check_attribute(&owner_name(object), &attr_str)?;
        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.attrs.borrow().get(&attr) {
                    return Ok(value.clone());
                }
                let class = Value::Class(Rc::clone(&instance.class));
                instance
                    .class
                    .lookup(attr)
                    .map(|value| bind(value, object, class))
                    .ok_or_else(|| attribute_error(&instance.class.name, &attr_str))
            }
            Value::Exception(exc) => {
                if attr == self.names.args {
                    return Ok(Value::tuple(exc.args.clone()));
                }
                if let Some(value) = exc.attrs.borrow().get(&attr) {
                    return Ok(value.clone());
                }
                exc.class
                    .as_ref()
                    .and_then(|class| {
                        let owner = Value::Class(Rc::clone(class));
                        class.lookup(attr).map(|value| bind(value, object, owner))
                    })
                    .ok_or_else(|| attribute_error(&exc.class_name(), &attr_str))
            }
            Value::Class(class) => match class.lookup(attr) {
                Some(Value::ClassMethod(inner)) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                    receiver: object.clone(),
                    method: Method::Callable((*inner).clone()),
                }))),
                Some(value) => Ok(value),
                None => Err(no_type_attribute(&class.name, &attr_str)),
            },
            Value::Module(module) => module.members.get(&attr).cloned().ok_or_else(|| {
                exception(
                    ExcType::AttributeError,
                    format!("module '{}' has no attribute '{attr_str}'", module.name),
                )
            }),
            Value::Type(ty) => methods::lookup(*ty, &attr_str)
                .map(|method| {
                    Value::BoundMethod(Rc::new(BoundMethod {
                        receiver: object.clone(),
                        method: Method::Primitive(method),
                    }))
                })
                .ok_or_else(|| no_type_attribute(ty.name(), &attr_str)),
            Value::Range(range) => match &*attr_str {
                "start" => Ok(Value::Int(range.start)),
                "stop" => Ok(Value::Int(range.stop)),
                "step" => Ok(Value::Int(range.step)),
                _ => Err(attribute_error("range", &attr_str)),
            },
            Value::Slice(slice) => match &*attr_str {
                "start" => Ok(slice.lower.clone()),
                "stop" => Ok(slice.upper.clone()),
                "step" => Ok(slice.step.clone()),
                _ => Err(attribute_error("slice", &attr_str)),
            },
            Value::Float(f) if &*attr_str == "real" => Ok(Value::Float(*f)),
            Value::Float(_) if &*attr_str == "imag" => Ok(Value::Float(0.0)),
            Value::Int(_) | Value::Bool(_) if &*attr_str == "real" => {
                Ok(Value::Int(object.as_int().unwrap_or_default()))
            }
            Value::Int(_) | Value::Bool(_) if &*attr_str == "imag" => Ok(Value::Int(0)),
            other => BuiltinType::of(other)
                .and_then(|ty| methods::lookup(ty, &attr_str))
                .map(|method| {
                    Value::BoundMethod(Rc::new(BoundMethod {
                        receiver: other.clone(),
                        method: Method::Primitive(method),
                    }))
                })
                .ok_or_else(|| attribute_error(&other.type_name(), &attr_str)),
        }
    }

    /// `object.attr = value`.
    pub(crate) fn store_attribute(&self, object: &Value, attr: Name, value: Value) -> EvalResult<()> {
        let attr_str = self.name_str(attr);
        check_attribute(&owner_name(object), &attr_str)?;
        match object {
            Value::Instance(instance) => {
                instance.attrs.borrow_mut().insert(attr, value);
                Ok(())
            }
            Value::Exception(exc) => {
                exc.attrs.borrow_mut().insert(attr, value);
                Ok(())
            }
            Value::Class(class) => {
                class.namespace.borrow_mut().insert(attr, value);
                Ok(())
            }
            other => Err(attribute_error(&other.type_name(), &attr_str)),
        }
    }
}
