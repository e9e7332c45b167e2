//! Native objects.
//!
//! Library code builds objects as module-like values (see
//! [`ModuleBuilder::object`](crate::session::ModuleBuilder::object)). An
//! object opts into calls, arithmetic and rich comparison by carrying native
//! `__call__`, `__add__`/`__radd__`, `__sub__`/`__rsub__`,
//! `__mul__`/`__rmul__` and
//! `__eq__`/`__lt__`/`__le__`/`__gt__`/`__ge__` members. Script classes
//! never reach this path: their dunders stay unsupported.

use dys_ir::{BinaryOp, CmpOp};

use super::Interpreter;
use crate::errors::EvalResult;
use crate::native::CallArgs;
use crate::operators;
use crate::value::Value;

/// Forward and reflected dunder of an arithmetic operator.
fn arithmetic_dunders(op: BinaryOp) -> Option<(&'static str, &'static str)> {
    match op {
        BinaryOp::Add => Some(("__add__", "__radd__")),
        BinaryOp::Sub => Some(("__sub__", "__rsub__")),
        BinaryOp::Mult => Some(("__mul__", "__rmul__")),
        _ => None,
    }
}

impl Interpreter<'_> {
    /// A native dunder member of a module-like object.
    pub(crate) fn object_method(&self, value: &Value, dunder: &str) -> Option<Value> {
        let Value::Module(object) = value else {
            return None;
        };
        let name = self.session.interner().get(dunder)?;
        object
            .members
            .get(&name)
            .filter(|member| matches!(member, Value::Native(_)))
            .cloned()
    }

    /// `left <op> right`, letting native objects take the operator first.
    pub(crate) fn binary_op(&mut self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
        if let Some((forward, reflected)) = arithmetic_dunders(op) {
            if let Some(method) = self.object_method(left, forward) {
                return self.call_value(&method, CallArgs::new(vec![right.clone()]));
            }
            if let Some(method) = self.object_method(right, reflected) {
                return self.call_value(&method, CallArgs::new(vec![left.clone()]));
            }
        }
        operators::binary(op, left, right, &self.limits)
    }

    /// One link of a comparison chain. `!=` is the negation of `__eq__`.
    pub(crate) fn compare_op(&mut self, op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
        let (dunder, negate) = match op {
            CmpOp::Eq => ("__eq__", false),
            CmpOp::NotEq => ("__eq__", true),
            CmpOp::Lt => ("__lt__", false),
            CmpOp::LtE => ("__le__", false),
            CmpOp::Gt => ("__gt__", false),
            CmpOp::GtE => ("__ge__", false),
            CmpOp::Is | CmpOp::IsNot | CmpOp::In | CmpOp::NotIn => {
                return operators::compare(op, left, right)
            }
        };
        match self.object_method(left, dunder) {
            Some(method) => {
                let answer = self.call_value(&method, CallArgs::new(vec![right.clone()]))?;
                Ok(answer.is_truthy() != negate)
            }
            None => operators::compare(op, left, right),
        }
    }
}
