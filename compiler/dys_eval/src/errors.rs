//! Evaluation errors and control signals.
//!
//! Every failure is an [`EvalError`]. Script-visible exceptions carry an
//! exception object; capability and resource failures are separate kinds
//! that no `except` clause can catch. Factory functions build the common
//! errors with the exact messages scripts observe.

use std::fmt;
use std::rc::Rc;

use dys_ir::SourceRange;

use crate::value::{repr_str, ExcType, ExceptionValue, Value};

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Result of executing a statement: a value or a signal to unwind.
pub type ExecResult = Result<Value, ControlAction>;

/// Non-local exits.
///
/// `Break`/`Continue` stop at the nearest loop, `Return` at the nearest
/// function body, `Raise` at the nearest matching handler. Only `Raise` is
/// visible to `try`.
#[derive(Clone, Debug)]
pub enum ControlAction {
    Break,
    Continue,
    Return(Value),
    Raise(EvalError),
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Raise(err)
    }
}

impl ControlAction {
    /// Convert an escaped signal into an error, for contexts where a
    /// signal has nowhere to go (top level, function bodies).
    pub fn into_error(self) -> EvalError {
        match self {
            ControlAction::Raise(err) => err,
            ControlAction::Break => syntax_error("'break' outside loop"),
            ControlAction::Continue => syntax_error("'continue' not properly in loop"),
            ControlAction::Return(_) => syntax_error("'return' outside function"),
        }
    }
}

/// Capability failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapabilityError {
    /// A callable not in the session whitelist.
    Denied { qualified: String },
    /// A private attribute or a deny-listed member.
    Forbidden { message: String },
    /// A hard-blocked builtin.
    Dangerous { message: String },
}

/// Which resource ran out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    NodeCalls,
    ScopeSize,
    CumulativeSize,
    CallDepth,
    ValueSize,
    FormatWidth,
    OutOfGas,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceError {
    pub kind: ResourceKind,
    pub message: String,
}

#[derive(Clone, Debug)]
pub enum EvalErrorKind {
    /// An exception object, raised by a script or by the runtime.
    Exception(Rc<ExceptionValue>),
    Capability(CapabilityError),
    Resource(ResourceError),
}

/// An evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Position of the innermost node the error crossed.
    pub span: Option<SourceRange>,
    pub notes: Vec<String>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            span: None,
            notes: Vec::new(),
        }
    }

    /// Wrap an exception object.
    pub fn from_exception(exc: Rc<ExceptionValue>) -> Self {
        EvalError::new(EvalErrorKind::Exception(exc))
    }

    /// Attach a position unless one is already set.
    #[must_use]
    pub fn located(mut self, at: impl FnOnce() -> SourceRange) -> Self {
        if self.span.is_none() {
            self.span = Some(at());
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Class name as reported to the host (`ZeroDivisionError`,
    /// `DangerousValue`, `MemoryError`, ...).
    pub fn class_name(&self) -> Rc<str> {
        match &self.kind {
            EvalErrorKind::Exception(exc) => exc.class_name(),
            EvalErrorKind::Capability(CapabilityError::Denied { .. }) => Rc::from("CapabilityDenied"),
            EvalErrorKind::Capability(CapabilityError::Forbidden { .. }) => {
                Rc::from("ForbiddenAccess")
            }
            EvalErrorKind::Capability(CapabilityError::Dangerous { .. }) => {
                Rc::from("DangerousValue")
            }
            EvalErrorKind::Resource(ResourceError {
                kind: ResourceKind::CallDepth,
                ..
            }) => Rc::from("RecursionError"),
            EvalErrorKind::Resource(_) => Rc::from("MemoryError"),
        }
    }

    /// `str(err)`.
    pub fn message(&self) -> String {
        match &self.kind {
            EvalErrorKind::Exception(exc) => exc.message(),
            EvalErrorKind::Capability(CapabilityError::Denied { qualified }) => format!(
                "Creativity needs constraint. This function is not allowed: '{qualified}'"
            ),
            EvalErrorKind::Capability(
                CapabilityError::Forbidden { message } | CapabilityError::Dangerous { message },
            ) => message.clone(),
            EvalErrorKind::Resource(resource) => resource.message.clone(),
        }
    }

    /// `repr(err)`: `ZeroDivisionError('division by zero')`.
    pub fn repr(&self) -> String {
        match &self.kind {
            EvalErrorKind::Exception(exc) => exc.repr(),
            _ => format!("{}({})", self.class_name(), repr_str(&self.message())),
        }
    }

    /// Whether an `except` clause may catch this error.
    pub fn is_catchable(&self) -> bool {
        match &self.kind {
            EvalErrorKind::Exception(exc) => !exc.is_instance_of(ExcType::MemoryError),
            EvalErrorKind::Capability(_) | EvalErrorKind::Resource(_) => false,
        }
    }

    /// The exception object, for catchable errors.
    pub fn exception(&self) -> Option<&Rc<ExceptionValue>> {
        match &self.kind {
            EvalErrorKind::Exception(exc) => Some(exc),
            _ => None,
        }
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match &self.kind {
            EvalErrorKind::Resource(resource) => Some(resource.kind),
            _ => None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message();
        if message.is_empty() {
            write!(f, "{}", self.class_name())?;
        } else {
            write!(f, "{}: {message}", self.class_name())?;
        }
        if let Some(span) = self.span {
            write!(f, " (line {}, column {})", span.lineno, span.col_offset)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

/// Raise a builtin exception class with one message argument.
#[cold]
pub fn exception(ty: ExcType, message: impl Into<String>) -> EvalError {
    let message = message.into();
    let args = if message.is_empty() {
        Vec::new()
    } else {
        vec![Value::string(message)]
    };
    EvalError::from_exception(Rc::new(ExceptionValue::new(ty, args)))
}

#[cold]
pub fn type_error(message: impl Into<String>) -> EvalError {
    exception(ExcType::TypeError, message)
}

#[cold]
pub fn value_error(message: impl Into<String>) -> EvalError {
    exception(ExcType::ValueError, message)
}

#[cold]
pub fn key_error(key: Value) -> EvalError {
    EvalError::from_exception(Rc::new(ExceptionValue::new(ExcType::KeyError, vec![key])))
}

#[cold]
pub fn index_error(message: impl Into<String>) -> EvalError {
    exception(ExcType::IndexError, message)
}

#[cold]
pub fn attribute_error(type_name: &str, attr: &str) -> EvalError {
    exception(
        ExcType::AttributeError,
        format!("'{type_name}' object has no attribute '{attr}'"),
    )
}

#[cold]
pub fn undefined_name(name: &str) -> EvalError {
    exception(ExcType::NameError, format!("name '{name}' is not defined"))
}

#[cold]
pub fn unbound_local(name: &str) -> EvalError {
    exception(
        ExcType::UnboundLocalError,
        format!("local variable '{name}' referenced before assignment"),
    )
}

#[cold]
pub fn division_by_zero() -> EvalError {
    exception(ExcType::ZeroDivisionError, "division by zero")
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    exception(ExcType::ZeroDivisionError, "integer division or modulo by zero")
}

#[cold]
pub fn float_division_by_zero() -> EvalError {
    exception(ExcType::ZeroDivisionError, "float division by zero")
}

#[cold]
pub fn overflow_error(operation: &str) -> EvalError {
    exception(
        ExcType::OverflowError,
        format!("integer overflow in {operation}"),
    )
}

#[cold]
pub fn not_implemented(message: impl Into<String>) -> EvalError {
    exception(ExcType::NotImplementedError, message)
}

#[cold]
pub fn import_error(name: &str, module: &str) -> EvalError {
    exception(
        ExcType::ImportError,
        format!("cannot import name '{name}' from '{module}'"),
    )
}

#[cold]
pub fn module_not_found(module: &str) -> EvalError {
    exception(
        ExcType::ModuleNotFoundError,
        format!("No module named '{module}'"),
    )
}

#[cold]
pub fn assertion_error(message: Option<Value>) -> EvalError {
    EvalError::from_exception(Rc::new(ExceptionValue::new(
        ExcType::AssertionError,
        message.into_iter().collect(),
    )))
}

#[cold]
pub fn syntax_error(message: impl Into<String>) -> EvalError {
    exception(ExcType::SyntaxError, message)
}

#[cold]
pub fn unhashable(type_name: impl fmt::Display) -> EvalError {
    type_error(format!("unhashable type: '{type_name}'"))
}

#[cold]
pub fn not_callable(type_name: impl fmt::Display) -> EvalError {
    type_error(format!("Sorry, {type_name} type is not callable"))
}

#[cold]
pub fn not_iterable(type_name: impl fmt::Display) -> EvalError {
    type_error(format!("'{type_name}' object is not iterable"))
}

#[cold]
pub fn unsupported_operands(op: &str, left: &Value, right: &Value) -> EvalError {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

#[cold]
pub fn denied(qualified: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Capability(CapabilityError::Denied {
        qualified: qualified.into(),
    }))
}

#[cold]
pub fn forbidden(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Capability(CapabilityError::Forbidden {
        message: message.into(),
    }))
}

#[cold]
pub fn dangerous(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Capability(CapabilityError::Dangerous {
        message: message.into(),
    }))
}

#[cold]
pub fn resource(kind: ResourceKind, message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Resource(ResourceError {
        kind,
        message: message.into(),
    }))
}

#[cold]
pub fn out_of_gas() -> EvalError {
    resource(ResourceKind::OutOfGas, "Out of Gas")
}

#[cfg(test)]
mod tests;
