//! Tree-walking interpreter for Dys.
//!
//! # Architecture
//!
//! Every expression goes through [`Interpreter::eval_expr`] and every
//! statement through [`Interpreter::exec_stmt`]. Both funnel the node
//! through the same epilogue:
//!
//! 1. dispatch on the node kind (`expr.rs`, `stmt.rs` and friends);
//! 2. check any callable the node produced against the whitelist;
//! 3. report the visit to the [`Tracker`], then to the script's node hook
//!    when one is installed;
//! 4. stamp an escaping error with the node's position, unless an inner
//!    node already did.
//!
//! A tracker error replaces the node's own outcome, so a program that ran
//! out of budget fails with the resource error even when the node also
//! failed.
//!
//! # Programs and scopes
//!
//! Script functions keep the [`SharedProgram`] they were defined in and the
//! scope snapshot taken at definition. Calling one swaps both into the
//! interpreter for the duration of the call, so ids always resolve against
//! the right arena.

mod assign;
mod attr;
mod builder;
mod call;
mod comprehension;
mod definitions;
mod exceptions;
mod expr;
mod imports;
mod objects;
mod stmt;

pub use builder::InterpreterBuilder;

use std::mem;

use dys_ir::{ExprArena, ExprId, Name, NodeKind, Program, SharedProgram, Span, StmtId};
use dys_stack::ensure_sufficient_stack;

use crate::accounting::{NodeRef, NodeVisit, ResourceLimits, Tracker};
use crate::capabilities::CapabilityId;
use crate::errors::{
    dangerous, syntax_error, undefined_name, ControlAction, EvalError, EvalResult, ExecResult,
};
use crate::native::CallArgs;
use crate::print_handler::SharedPrintHandler;
use crate::scope::{new_layer, Scope};
use crate::session::Session;
use crate::validator::validate;
use crate::value::{Method, Value};

/// Names the interpreter compares against on hot paths.
#[derive(Copy, Clone)]
pub(crate) struct WellKnown {
    pub(crate) init: Name,
    pub(crate) doc: Name,
    pub(crate) args: Name,
}

impl WellKnown {
    fn new(session: &Session) -> Self {
        let interner = session.interner();
        WellKnown {
            init: interner.intern("__init__"),
            doc: interner.intern("__doc__"),
            args: interner.intern("args"),
        }
    }
}

/// Evaluates Dys programs against one session.
pub struct Interpreter<'a> {
    pub(crate) session: Session,
    pub(crate) names: WellKnown,
    /// Program whose arena the running code lives in.
    pub(crate) program: SharedProgram,
    pub(crate) scope: Scope,
    pub(crate) tracker: Box<dyn Tracker + 'a>,
    pub(crate) limits: ResourceLimits,
    pub(crate) call_depth: usize,
    /// Most recent value produced by an expression.
    pub(crate) last_value: Value,
    pub(crate) print_handler: SharedPrintHandler,
    /// Exceptions being handled by enclosing `except` blocks, innermost
    /// last; a bare `raise` re-raises the top.
    pub(crate) handling: Vec<EvalError>,
    /// Script callback run after every positioned node.
    pub(crate) node_hook: Option<Value>,
    pub(crate) in_hook: bool,
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        // Functions hold the globals layer they were defined in; clearing it
        // breaks those cycles.
        self.scope.clear_locals_and_globals();
    }
}

fn empty_program() -> SharedProgram {
    SharedProgram::new(Program::new(ExprArena::new(), Vec::new(), ""))
}

impl<'a> Interpreter<'a> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn tracker_mut(&mut self) -> &mut (dyn Tracker + 'a) {
        self.tracker.as_mut()
    }

    /// Write program output.
    pub fn print(&self, text: &str) {
        self.print_handler.print(text);
    }

    /// Parse and validate `source` in this session.
    ///
    /// Syntax and validation errors carry the offending position.
    pub fn load(&mut self, source: &str) -> EvalResult<SharedProgram> {
        let program = dys_parse::parse(source, self.session.interner()).map_err(|err| {
            let lines = dys_ir::LineIndex::new(source);
            syntax_error(err.message).located(|| lines.locate(err.span))
        })?;
        validate(&program)?;
        self.tracker.on_program(&program);
        Ok(SharedProgram::new(program))
    }

    /// Run a loaded program in the current globals; returns the value of
    /// the last statement.
    #[tracing::instrument(level = "debug", skip_all, fields(program = program.id.raw()))]
    pub fn run(&mut self, program: &SharedProgram) -> EvalResult {
        let saved = mem::replace(&mut self.program, program.clone());
        let result = self.run_body();
        self.program = saved;
        result
    }

    fn run_body(&mut self) -> EvalResult {
        let program = self.program.clone();
        let mut last = Value::None;
        let mut result = Ok(());
        for &stmt in &program.body {
            match self.exec_stmt(stmt) {
                Ok(value) => last = value,
                Err(signal) => {
                    result = Err(signal.into_error());
                    break;
                }
            }
        }
        // The module itself is the last node visited, unless an abort is
        // already on its way out.
        if !aborting(&result) {
            self.track(&program, NodeKind::Module, program.span)?;
        }
        result.map(|()| last)
    }

    /// Load and run `source`.
    pub fn run_source(&mut self, source: &str) -> EvalResult {
        let program = self.load(source)?;
        self.run(&program)
    }

    /// A global binding of the running program.
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.session.interner().get(name)?;
        self.scope.globals().borrow().get(&name).cloned()
    }

    /// Names bound in the globals layer, in binding order.
    pub fn global_names(&self) -> Vec<std::sync::Arc<str>> {
        let interner = self.session.interner();
        self.scope
            .globals()
            .borrow()
            .keys()
            .map(|name| interner.lookup(*name))
            .collect()
    }

    /// Call the global function `name`.
    pub fn call(&mut self, name: &str, args: CallArgs) -> EvalResult {
        let func = self.global(name).ok_or_else(|| undefined_name(name))?;
        self.check_callable(&func)?;
        self.call_value(&func, args)
    }

    /// Evaluate `source` in a fresh globals layer seeded from `globals`,
    /// under `limits` clamped to the current ones, sharing this
    /// interpreter's counters. `hook` is called after every node.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn eval_nested(
        &mut self,
        source: &str,
        globals: Vec<(Name, Value)>,
        limits: ResourceLimits,
        hook: Option<Value>,
    ) -> EvalResult {
        let program = self.load(source)?;
        let layer = new_layer();
        layer.borrow_mut().extend(globals);
        let scope = Scope::new(self.scope.builtins().clone(), layer);
        let limits = limits.clamped_to(&self.limits);

        let saved_scope = mem::replace(&mut self.scope, scope);
        let saved_limits = mem::replace(&mut self.limits, limits);
        let saved_hook = match hook {
            Some(hook) => self.node_hook.replace(hook),
            None => self.node_hook.clone(),
        };
        self.tracker.enter_nested(&limits);

        let result = self.run(&program);

        self.tracker.exit_nested();
        self.node_hook = saved_hook;
        self.limits = saved_limits;
        self.scope = saved_scope;
        result
    }

    /// Evaluate one expression of the current program.
    pub(crate) fn eval_expr(&mut self, id: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| {
            let program = self.program.clone();
            let expr = program.arena.expr(id);
            let result = self.dispatch_expr(&program, id, expr).and_then(|value| {
                self.check_callable(&value)?;
                Ok(value)
            });
            if let Ok(value) = &result {
                self.last_value = value.clone();
            }
            let tracked = if aborting(&result) {
                Ok(())
            } else {
                self.track(&program, expr.kind.node_kind(), expr.span)
            };
            tracked
                .and(result)
                .map_err(|err| err.located(|| program.locate(expr.span)))
        })
    }

    /// Execute one statement of the current program.
    pub(crate) fn exec_stmt(&mut self, id: StmtId) -> ExecResult {
        ensure_sufficient_stack(|| {
            let program = self.program.clone();
            let stmt = program.arena.stmt(id);
            let result = self.dispatch_stmt(&program, id, stmt);
            let tracked = match &result {
                Err(ControlAction::Raise(err)) if !err.is_catchable() => Ok(()),
                _ => self.track(&program, stmt.kind.node_kind(), stmt.span),
            };
            match tracked.map_err(ControlAction::from).and(result) {
                Err(ControlAction::Raise(err)) => Err(ControlAction::Raise(
                    err.located(|| program.locate(stmt.span)),
                )),
                other => other,
            }
        })
    }

    /// Execute a block, stopping at the first signal.
    pub(crate) fn exec_block(&mut self, body: &[StmtId]) -> ExecResult {
        for &stmt in body {
            self.exec_stmt(stmt)?;
        }
        Ok(Value::None)
    }

    /// Report a visit to the tracker and the node hook.
    pub(crate) fn track(&mut self, program: &Program, kind: NodeKind, span: Span) -> Result<(), EvalError> {
        let range = program.locate(span);
        let visit = NodeVisit {
            kind,
            range,
            node: NodeRef {
                program: program.id,
                kind,
                span,
            },
            scope: &self.scope,
            last: &self.last_value,
            interner: self.session.interner(),
        };
        self.tracker.on_node(&visit)?;

        if !kind.has_position() || self.in_hook {
            return Ok(());
        }
        let Some(hook) = self.node_hook.clone() else {
            return Ok(());
        };
        let args = CallArgs::new(vec![
            Value::Int(i64::from(range.lineno)),
            Value::Int(i64::from(range.col_offset)),
            Value::Int(i64::from(range.end_lineno)),
            Value::Int(i64::from(range.end_col_offset)),
            Value::str(kind.name()),
        ]);
        self.in_hook = true;
        let result = self.call_value(&hook, args);
        self.in_hook = false;
        result.map(drop)
    }

    /// Whitelist check for a callable the program got hold of.
    pub(crate) fn check_callable(&self, value: &Value) -> Result<(), EvalError> {
        let capabilities = self.session.capabilities();
        match value {
            Value::Blocked(blocked) => Err(dangerous(format!(
                "This function is forbidden: builtins.{}",
                blocked.name()
            ))),
            Value::Native(f) => capabilities.check(&f.capability()),
            Value::Function(f) => capabilities.check(&f.capability()),
            Value::Class(c) => capabilities.check(&c.capability()),
            Value::Type(ty) => capabilities.check(&CapabilityId::Type(*ty)),
            Value::ExceptionType(ty) => capabilities.check(&CapabilityId::Exception(*ty)),
            Value::BoundMethod(bound) => match &bound.method {
                Method::Primitive(m) => capabilities.check(&CapabilityId::Method {
                    owner: m.owner,
                    name: m.name,
                }),
                Method::Callable(inner) => self.check_callable(inner),
            },
            _ => Ok(()),
        }
    }

    /// Look a name up through the scope chain.
    pub(crate) fn lookup(&self, name: Name) -> EvalResult {
        self.scope
            .get(name)
            .ok_or_else(|| undefined_name(&self.session.interner().lookup(name)))
    }

    pub(crate) fn name_str(&self, name: Name) -> std::sync::Arc<str> {
        self.session.interner().lookup(name)
    }
}

/// An uncatchable error is unwinding: no further node is visited, so the
/// first abort is the one reported.
fn aborting<T>(result: &Result<T, EvalError>) -> bool {
    result.as_ref().is_err_and(|err| !err.is_catchable())
}
