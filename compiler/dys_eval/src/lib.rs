//! Dys Eval - sandboxed evaluator for the Dys language.
//!
//! This crate walks the `dys_ir` tree of a parsed program and evaluates it
//! under a capability whitelist and resource limits.
//!
//! # Architecture
//!
//! - [`Session`]: interner, whitelist, builtins layer and importable modules
//! - [`Interpreter`]: evaluates programs in one session
//! - [`Tracker`]: observes every visited node; [`Accountant`] enforces the
//!   node, scope-size and cumulative-size limits
//! - [`Value`]: runtime values, with Python-compatible `repr` and equality
//!
//! Hosts extend a session with [`ModuleBuilder`] modules and native
//! functions built with [`native`].

pub mod accounting;
pub mod builtins;
pub mod capabilities;
pub mod coverage;
pub mod errors;
pub mod format;
pub mod interpreter;
pub mod iter;
pub mod native;
pub mod operators;
pub mod print_handler;
pub mod scope;
pub mod sequence;
pub mod session;
pub mod validator;
pub mod value;

pub use accounting::{
    Accountant, NodeRef, NodeVisit, NoopTracker, ResourceLimits, ResourceState, SharedState, Tally,
    Tracker,
};
pub use capabilities::{CapabilityId, CapabilitySet, DefId, DefNode, NativeId};
pub use coverage::{Coverage, CoverageEntry, Covered, SharedCoverage};
pub use errors::{
    ControlAction, EvalError, EvalErrorKind, EvalResult, ExecResult, ResourceKind,
};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use native::{native, CallArgs, NativeFn};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use scope::{new_layer, Layer, Scope};
pub use session::{ModuleBuilder, Session};
pub use value::{
    Dict, ExcType, ExceptionValue, ModuleValue, ObjectForm, Value, ValueSet,
};

#[cfg(test)]
mod tests;
