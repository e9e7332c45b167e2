//! Native function plumbing: the Rust signature every builtin, library
//! member and host capability implements, and the bound argument pack.

use std::rc::Rc;
use std::sync::Arc;

use crate::errors::{type_error, EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A native function body.
pub type NativeFn = Rc<dyn for<'i> Fn(&mut Interpreter<'i>, CallArgs) -> EvalResult>;

/// Wrap a closure as a [`NativeFn`].
pub fn native<F>(f: F) -> NativeFn
where
    F: for<'i> Fn(&mut Interpreter<'i>, CallArgs) -> EvalResult + 'static,
{
    Rc::new(f)
}

/// Arguments of one call, after `*` and `**` expansion.
#[derive(Clone, Debug, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(Arc<str>, Value)>,
}

impl CallArgs {
    pub fn new(positional: Vec<Value>) -> Self {
        CallArgs {
            positional,
            keywords: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// Fail unless there are no keyword arguments.
    pub fn no_keywords(&self, func: &str) -> Result<(), EvalError> {
        match self.keywords.first() {
            Some(_) => Err(type_error(format!("{func}() takes no keyword arguments"))),
            None => Ok(()),
        }
    }

    /// Fail unless the positional count is within `min..=max` and there
    /// are no keywords.
    pub fn arity(&self, func: &str, min: usize, max: usize) -> Result<(), EvalError> {
        self.no_keywords(func)?;
        self.positional_arity(func, min, max)
    }

    /// Like [`CallArgs::arity`], keywords allowed.
    pub fn positional_arity(&self, func: &str, min: usize, max: usize) -> Result<(), EvalError> {
        let n = self.positional.len();
        if n >= min && n <= max {
            return Ok(());
        }
        Err(type_error(if min == max {
            let plural = if min == 1 { "" } else { "s" };
            format!("{func}() takes exactly {min} argument{plural} ({n} given)")
        } else if n < min {
            let plural = if min == 1 { "" } else { "s" };
            format!("{func}() takes at least {min} argument{plural} ({n} given)")
        } else {
            let plural = if max == 1 { "" } else { "s" };
            format!("{func}() takes at most {max} argument{plural} ({n} given)")
        }))
    }

    /// Remove and return a keyword argument.
    pub fn take_keyword(&mut self, name: &str) -> Option<Value> {
        let index = self.keywords.iter().position(|(k, _)| &**k == name)?;
        Some(self.keywords.remove(index).1)
    }

    /// Fail if any keyword argument is left over.
    pub fn no_extra_keywords(&self, func: &str) -> Result<(), EvalError> {
        match self.keywords.first() {
            Some((name, _)) => Err(type_error(format!(
                "{func}() got an unexpected keyword argument '{name}'"
            ))),
            None => Ok(()),
        }
    }

    /// Positional argument `index` or keyword `name`, whichever is given.
    pub fn take(&mut self, index: usize, name: &str) -> Option<Value> {
        match self.take_keyword(name) {
            Some(value) => Some(value),
            None => self.positional.get(index).cloned(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Positional argument `index`, which `arity` already guaranteed.
    pub fn arg(&self, index: usize) -> Value {
        self.positional.get(index).cloned().unwrap_or(Value::None)
    }
}
