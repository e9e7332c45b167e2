//! Script-level tests of the interpreter.
//!
//! Each helper runs a source snippet in a fresh interpreter with captured
//! output; the value of a snippet is the value of its last statement.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

mod control_tests;
mod exceptions_tests;
mod functions_tests;
mod nested_tests;

use crate::errors::EvalError;
use crate::interpreter::{Interpreter, InterpreterBuilder};
use crate::print_handler::buffer_handler;
use crate::value::Value;

pub(crate) fn interpreter() -> Interpreter<'static> {
    InterpreterBuilder::new()
        .print_handler(buffer_handler(10_000))
        .build()
}

/// Value of the last statement.
pub(crate) fn eval(source: &str) -> Value {
    interpreter()
        .run_source(source)
        .unwrap_or_else(|err| panic!("{source:?} failed: {err}"))
}

/// `repr` of the last statement's value.
pub(crate) fn repr(source: &str) -> String {
    eval(source).repr()
}

pub(crate) fn eval_err(source: &str) -> EvalError {
    match interpreter().run_source(source) {
        Ok(value) => panic!("{source:?} returned {} instead of failing", value.repr()),
        Err(err) => err,
    }
}

/// `"ClassName: message"` of the error a snippet fails with.
pub(crate) fn error(source: &str) -> String {
    let err = eval_err(source);
    let message = err.message();
    if message.is_empty() {
        err.class_name().to_string()
    } else {
        format!("{}: {message}", err.class_name())
    }
}

/// Everything the snippet printed.
pub(crate) fn output(source: &str) -> String {
    let mut interp = interpreter();
    interp
        .run_source(source)
        .unwrap_or_else(|err| panic!("{source:?} failed: {err}"));
    interp.print_handler().get_output()
}
