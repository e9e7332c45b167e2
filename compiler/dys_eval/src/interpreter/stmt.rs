//! Statement dispatch and loops.

use dys_ir::{BinaryOp, ExprId, ExprKind, Program, Stmt, StmtId, StmtKind};

use super::Interpreter;
use crate::errors::{
    assertion_error, not_implemented, undefined_name, unbound_local, ControlAction, EvalResult,
    ExecResult,
};
use crate::iter::iterate;
use crate::sequence::del_item;
use crate::value::Value;

/// How a loop body ended.
enum LoopExit {
    Next,
    Break,
}

fn loop_exit(result: ExecResult) -> Result<LoopExit, ControlAction> {
    match result {
        Ok(_) | Err(ControlAction::Continue) => Ok(LoopExit::Next),
        Err(ControlAction::Break) => Ok(LoopExit::Break),
        Err(other) => Err(other),
    }
}

impl Interpreter<'_> {
    pub(super) fn dispatch_stmt(&mut self, program: &Program, id: StmtId, stmt: &Stmt) -> ExecResult {
        match &stmt.kind {
            StmtKind::Expr(value) => Ok(self.eval_expr(*value)?),
            StmtKind::Assign { targets, value } => {
                let value = self.eval_expr(*value)?;
                for &target in targets {
                    self.assign(program, target, value.clone())?;
                }
                Ok(Value::None)
            }
            StmtKind::AugAssign { target, op, value } => {
                self.exec_aug_assign(program, *target, *op, *value)?;
                Ok(Value::None)
            }
            StmtKind::AnnAssign { target, value, .. } => {
                if let Some(value) = value {
                    let value = self.eval_expr(*value)?;
                    self.assign(program, *target, value)?;
                }
                Ok(Value::None)
            }
            StmtKind::Pass => Ok(Value::None),
            StmtKind::Break => Err(ControlAction::Break),
            StmtKind::Continue => Err(ControlAction::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expr(*value)?,
                    None => Value::None,
                };
                Err(ControlAction::Return(value))
            }
            StmtKind::Raise { exc, cause } => self.exec_raise(*exc, *cause),
            StmtKind::Assert { test, msg } => {
                if self.eval_expr(*test)?.is_truthy() {
                    return Ok(Value::None);
                }
                let msg = match msg {
                    Some(msg) => Some(self.eval_expr(*msg)?),
                    None => None,
                };
                Err(assertion_error(msg).into())
            }
            StmtKind::Delete(targets) => {
                self.exec_delete(program, targets)?;
                Ok(Value::None)
            }
            StmtKind::Import(aliases) => {
                self.exec_import(program, aliases)?;
                Ok(Value::None)
            }
            StmtKind::ImportFrom { module, names } => {
                self.exec_import_from(program, *module, names)?;
                Ok(Value::None)
            }
            StmtKind::If { test, body, orelse } => {
                if self.eval_expr(*test)?.is_truthy() {
                    self.exec_block(body)
                } else {
                    self.exec_block(orelse)
                }
            }
            StmtKind::While { test, body, orelse } => {
                loop {
                    if !self.eval_expr(*test)?.is_truthy() {
                        self.exec_block(orelse)?;
                        break;
                    }
                    if let LoopExit::Break = loop_exit(self.exec_block(body))? {
                        break;
                    }
                }
                Ok(Value::None)
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let iterable = self.eval_expr(*iter)?;
                for item in iterate(&iterable)? {
                    self.assign(program, *target, item)?;
                    if let LoopExit::Break = loop_exit(self.exec_block(body))? {
                        return Ok(Value::None);
                    }
                }
                self.exec_block(orelse)
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => self.exec_try(program, body, handlers, orelse, finalbody),
            StmtKind::FunctionDef(def) => {
                self.define_function(program, id, def)?;
                Ok(Value::None)
            }
            StmtKind::ClassDef(def) => {
                self.define_class(program, id, def)?;
                Ok(Value::None)
            }
            StmtKind::Global(_)
            | StmtKind::Nonlocal(_)
            | StmtKind::With { .. }
            | StmtKind::Async { .. } => Err(not_implemented(format!(
                "Sorry, {} is not available in this evaluator",
                stmt.kind.node_kind().name()
            ))
            .into()),
        }
    }

    fn exec_aug_assign(
        &mut self,
        program: &Program,
        target: ExprId,
        op: BinaryOp,
        value: ExprId,
    ) -> EvalResult<()> {
        if let ExprKind::Name(name) = program.arena.expr(target).kind {
            // Inside a function, `x += 1` needs a local `x`.
            if self.scope.depth() > 2 && !self.scope.contains_local(name) {
                return Err(unbound_local(&self.name_str(name)));
            }
        }
        let current = self.eval_expr(target)?;
        let operand = self.eval_expr(value)?;
        let result = self.binary_op(op, &current, &operand)?;
        // `list += list` updates in place, so aliases see it.
        if let (Value::List(items), BinaryOp::Add, Value::List(joined)) = (&current, op, &result) {
            let joined = joined.borrow().clone();
            *items.borrow_mut() = joined;
            return self.assign(program, target, current.clone());
        }
        self.assign(program, target, result)
    }

    fn exec_delete(&mut self, program: &Program, targets: &[ExprId]) -> EvalResult<()> {
        let [target] = targets else {
            return Err(not_implemented(format!(
                "Sorry, cannot delete {} targets.",
                targets.len()
            )));
        };
        let expr = program.arena.expr(*target);
        match &expr.kind {
            ExprKind::Name(name) => {
                self.track(program, expr.kind.node_kind(), expr.span)?;
                if self.scope.delete(*name) {
                    Ok(())
                } else {
                    Err(undefined_name(&self.name_str(*name)))
                }
            }
            ExprKind::Subscript { value, slice } => {
                let container = self.eval_expr(*value)?;
                let key = self.eval_expr(*slice)?;
                del_item(&container, &key)
            }
            other => Err(not_implemented(format!(
                "Sorry, cannot delete {}",
                other.node_kind().name()
            ))),
        }
    }
}
