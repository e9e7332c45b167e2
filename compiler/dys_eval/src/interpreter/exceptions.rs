//! `try` and `raise`.
//!
//! Only catchable errors reach `except` clauses. Capability and resource
//! errors unwind past every handler and skip `finally` blocks too, so an
//! aborted program runs no further code.

use std::rc::Rc;

use dys_ir::{ExceptHandler, ExprId, NodeKind, Program, StmtId};

use super::Interpreter;
use crate::errors::{exception, type_error, ControlAction, EvalError, EvalResult, ExecResult};
use crate::native::CallArgs;
use crate::value::{ExcType, ExceptionValue, Value};

impl Interpreter<'_> {
    pub(super) fn exec_raise(&mut self, exc: Option<ExprId>, cause: Option<ExprId>) -> ExecResult {
        let Some(exc) = exc else {
            let active = self
                .handling
                .last()
                .cloned()
                .unwrap_or_else(|| exception(ExcType::Exception, "No active exception to reraise"));
            return Err(ControlAction::Raise(active));
        };
        let value = self.eval_expr(exc)?;
        let exc = self.make_exception(value)?;
        if let Some(cause) = cause {
            let cause = match self.eval_expr(cause)? {
                Value::None => Value::None,
                other => Value::Exception(self.make_exception(other)?),
            };
            *exc.cause.borrow_mut() = Some(cause);
        }
        Err(ControlAction::Raise(EvalError::from_exception(exc)))
    }

    /// The exception object `raise value` throws.
    fn make_exception(&mut self, value: Value) -> EvalResult<Rc<ExceptionValue>> {
        match value {
            Value::Exception(exc) => Ok(exc),
            Value::ExceptionType(ty) => Ok(Rc::new(ExceptionValue::new(ty, Vec::new()))),
            Value::Class(ref class) if class.exc_base.is_some() => {
                match self.call_value(&value, CallArgs::default())? {
                    Value::Exception(exc) => Ok(exc),
                    _ => Err(type_error("exceptions must derive from BaseException")),
                }
            }
            _ => Err(type_error("exceptions must derive from BaseException")),
        }
    }

    /// Whether `err` is an instance of the handler's class (or one of a
    /// tuple of classes).
    fn handler_matches(&self, class: &Value, err: &EvalError) -> EvalResult<bool> {
        let Some(exc) = err.exception() else {
            return Ok(false);
        };
        match class {
            Value::ExceptionType(ty) => Ok(exc.is_instance_of(*ty)),
            Value::Class(class) if class.exc_base.is_some() => Ok(exc
                .class
                .as_ref()
                .is_some_and(|own| own.is_subclass_of(class))),
            Value::Tuple(classes) => {
                for class in classes.iter() {
                    if self.handler_matches(class, err)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(type_error(
                "catching classes that do not inherit from BaseException is not allowed",
            )),
        }
    }

    pub(super) fn exec_try(
        &mut self,
        program: &Program,
        body: &[StmtId],
        handlers: &[ExceptHandler],
        orelse: &[StmtId],
        finalbody: &[StmtId],
    ) -> ExecResult {
        let outcome = match self.exec_block(body) {
            Ok(_) => self.exec_block(orelse),
            Err(ControlAction::Raise(err)) if err.is_catchable() => {
                self.handle(program, handlers, err)
            }
            Err(other) => Err(other),
        };
        if let Err(ControlAction::Raise(err)) = &outcome {
            if !err.is_catchable() {
                return outcome;
            }
        }
        if finalbody.is_empty() {
            return outcome;
        }
        // A signal from `finally` replaces the pending outcome.
        self.exec_block(finalbody)?;
        outcome
    }

    fn handle(&mut self, program: &Program, handlers: &[ExceptHandler], err: EvalError) -> ExecResult {
        for handler in handlers {
            let matched = match handler.ty {
                None => true,
                Some(ty) => {
                    let class = self.eval_expr(ty)?;
                    self.handler_matches(&class, &err)?
                }
            };
            self.track(program, NodeKind::ExceptHandler, handler.span)?;
            if !matched {
                continue;
            }
            if let (Some(name), Some(exc)) = (handler.name, err.exception()) {
                self.scope.set(name, Value::Exception(Rc::clone(exc)));
            }
            self.handling.push(err);
            let result = self.exec_block(&handler.body);
            self.handling.pop();
            if let Some(name) = handler.name {
                self.scope.delete(name);
            }
            return result;
        }
        Err(ControlAction::Raise(err))
    }
}
