//! Assignment targets and unpacking.

use dys_ir::{ExprId, ExprKind, Program};

use super::Interpreter;
use crate::errors::{not_implemented, syntax_error, type_error, value_error, EvalResult};
use crate::iter::collect;
use crate::sequence::set_item;
use crate::value::Value;

impl Interpreter<'_> {
    /// Bind `value` to an assignment target.
    pub(crate) fn assign(&mut self, program: &Program, target: ExprId, value: Value) -> EvalResult<()> {
        let expr = program.arena.expr(target);
        self.track(program, expr.kind.node_kind(), expr.span)?;
        match &expr.kind {
            ExprKind::Name(name) => {
                self.scope.set(*name, value);
                Ok(())
            }
            ExprKind::Subscript { value: container, slice } => {
                let container = self.eval_expr(*container)?;
                let key = self.eval_expr(*slice)?;
                set_item(&container, &key, value)
            }
            ExprKind::Attribute { value: object, attr } => {
                let object = self.eval_expr(*object)?;
                self.store_attribute(&object, *attr, value)
            }
            ExprKind::Tuple(elts) | ExprKind::List(elts) => self.unpack(program, elts, &value),
            ExprKind::Starred(inner) => self.assign(program, *inner, value),
            other => Err(not_implemented(format!(
                "Sorry, cannot assign to {}",
                other.node_kind().name()
            ))),
        }
    }

    fn unpack(&mut self, program: &Program, targets: &[ExprId], value: &Value) -> EvalResult<()> {
        if value.len().is_none() {
            return Err(type_error(format!(
                "cannot unpack non-iterable {} object",
                value.type_name()
            )));
        }
        let values = collect(value, &self.limits)?;
        let starred: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(program.arena.expr(**t).kind, ExprKind::Starred(_)))
            .map(|(i, _)| i)
            .collect();

        match starred.as_slice() {
            [] => {
                if values.len() < targets.len() {
                    return Err(value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        values.len()
                    )));
                }
                if values.len() > targets.len() {
                    return Err(value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (&target, item) in targets.iter().zip(values) {
                    self.assign(program, target, item)?;
                }
                Ok(())
            }
            [star] => {
                let star = *star;
                let fixed = targets.len() - 1;
                if values.len() < fixed {
                    return Err(value_error(format!(
                        "not enough values to unpack (expected at least {fixed}, got {})",
                        values.len()
                    )));
                }
                let after = targets.len() - star - 1;
                let mut values = values;
                let tail = values.split_off(values.len() - after);
                let middle = values.split_off(star);
                for (&target, item) in targets[..star].iter().zip(values) {
                    self.assign(program, target, item)?;
                }
                self.assign(program, targets[star], Value::list(middle))?;
                for (&target, item) in targets[star + 1..].iter().zip(tail) {
                    self.assign(program, target, item)?;
                }
                Ok(())
            }
            _ => Err(syntax_error("multiple starred expressions in assignment")),
        }
    }
}
