//! Expression dispatch.

use std::rc::Rc;

use dys_ir::{BoolOp, CmpOp, Constant, Conversion, Expr, ExprId, ExprKind, Program};

use super::Interpreter;
use crate::errors::{
    not_implemented, resource, syntax_error, type_error, EvalError, EvalResult, ResourceKind,
};
use crate::format::format_value;
use crate::operators;
use crate::sequence::get_item;
use crate::value::{ascii_repr, Dict, SliceValue, Value, ValueSet};

impl Interpreter<'_> {
    pub(super) fn dispatch_expr(&mut self, program: &Program, id: ExprId, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Constant(constant) => self.eval_constant(constant),
            ExprKind::Name(name) => self.lookup(*name),
            ExprKind::BoolOp { op, values } => self.eval_bool_op(*op, values),
            ExprKind::NamedExpr { target, value } => {
                let value = self.eval_expr(*value)?;
                self.scope.set(*target, value.clone());
                Ok(value)
            }
            ExprKind::BinOp { left, op, right } => {
                let left = self.eval_expr(*left)?;
                let right = self.eval_expr(*right)?;
                self.binary_op(*op, &left, &right)
            }
            ExprKind::UnaryOp { op, operand } => {
                let operand = self.eval_expr(*operand)?;
                operators::unary(*op, &operand)
            }
            ExprKind::Lambda { params, body } => self.make_lambda(program, id, params, *body),
            ExprKind::IfExp { test, body, orelse } => {
                if self.eval_expr(*test)?.is_truthy() {
                    self.eval_expr(*body)
                } else {
                    self.eval_expr(*orelse)
                }
            }
            ExprKind::Dict(entries) => {
                self.check_display_len("Dict", entries.len())?;
                let mut dict = Dict::new();
                for entry in entries {
                    match entry.key {
                        Some(key) => {
                            let key = self.eval_expr(key)?;
                            let value = self.eval_expr(entry.value)?;
                            dict.insert(key, value)?;
                        }
                        None => {
                            let value = self.eval_expr(entry.value)?;
                            merge_mapping(&mut dict, &value)?;
                        }
                    }
                }
                Ok(Value::dict(dict))
            }
            ExprKind::Set(elts) => {
                self.check_display_len("Set", elts.len())?;
                let items = self.eval_elements(program, elts)?;
                Ok(Value::set(ValueSet::from_values(items)?))
            }
            ExprKind::List(elts) => {
                self.check_display_len("List", elts.len())?;
                Ok(Value::list(self.eval_elements(program, elts)?))
            }
            ExprKind::Tuple(elts) => {
                self.check_display_len("Tuple", elts.len())?;
                Ok(Value::tuple(self.eval_elements(program, elts)?))
            }
            ExprKind::ListComp { elt, generators } => self.eval_list_comp(*elt, generators),
            ExprKind::SetComp { elt, generators } => self.eval_set_comp(*elt, generators),
            ExprKind::GeneratorExp { elt, generators } => self.eval_list_comp(*elt, generators),
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => self.eval_dict_comp(*key, *value, generators),
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => self.eval_compare(*left, ops, comparators),
            ExprKind::Call {
                func,
                args,
                keywords,
            } => self.eval_call(program, *func, args, keywords),
            ExprKind::FormattedValue {
                value,
                conversion,
                format_spec,
            } => self.eval_formatted(*value, *conversion, *format_spec),
            ExprKind::JoinedStr(parts) => self.eval_joined(parts),
            ExprKind::Attribute { value, attr } => self.load_attribute(*value, *attr),
            ExprKind::Subscript { value, slice } => {
                let container = self.eval_expr(*value)?;
                let key = self.eval_expr(*slice)?;
                get_item(&container, &key)
            }
            ExprKind::Slice { lower, upper, step } => {
                let mut bound = |expr: Option<ExprId>| match expr {
                    Some(expr) => self.eval_expr(expr),
                    None => Ok(Value::None),
                };
                let lower = bound(*lower)?;
                let upper = bound(*upper)?;
                let step = bound(*step)?;
                Ok(Value::Slice(Rc::new(SliceValue { lower, upper, step })))
            }
            ExprKind::Starred(_) => Err(syntax_error("can't use starred expression here")),
            ExprKind::Await(_) | ExprKind::Yield(_) | ExprKind::YieldFrom(_) => Err(
                not_implemented(format!(
                    "Sorry, {} is not available in this evaluator",
                    expr.kind.node_kind().name()
                )),
            ),
        }
    }

    fn eval_constant(&self, constant: &Constant) -> EvalResult {
        let max = self.limits.max_string_length;
        Ok(match constant {
            Constant::None => Value::None,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::Float(f) => Value::Float(*f),
            Constant::Ellipsis => Value::Ellipsis,
            Constant::Str(s) => {
                let len = s.chars().count();
                if len > max {
                    return Err(resource(
                        ResourceKind::ValueSize,
                        format!("String Literal in statement is too long! ({len}, when {max} is max)"),
                    ));
                }
                Value::str(s)
            }
            Constant::Bytes(b) => {
                if b.len() > max {
                    return Err(resource(
                        ResourceKind::ValueSize,
                        format!(
                            "Byte Literal in statement is too long! ({}, when {max} is max)",
                            b.len()
                        ),
                    ));
                }
                Value::bytes(b)
            }
        })
    }

    fn eval_bool_op(&mut self, op: BoolOp, values: &[ExprId]) -> EvalResult {
        let mut last = Value::None;
        for &value in values {
            last = self.eval_expr(value)?;
            let decided = match op {
                BoolOp::And => !last.is_truthy(),
                BoolOp::Or => last.is_truthy(),
            };
            if decided {
                break;
            }
        }
        Ok(last)
    }

    fn check_display_len(&self, what: &str, len: usize) -> Result<(), EvalError> {
        if len > self.limits.max_string_length {
            return Err(resource(
                ResourceKind::ValueSize,
                format!("{what} in statement is too long!"),
            ));
        }
        Ok(())
    }

    /// Evaluate display elements, expanding `*iterable` items.
    pub(super) fn eval_elements(&mut self, program: &Program, elts: &[ExprId]) -> EvalResult<Vec<Value>> {
        let mut items = Vec::with_capacity(elts.len());
        for &elt in elts {
            if let ExprKind::Starred(inner) = &program.arena.expr(elt).kind {
                let value = self.eval_expr(*inner)?;
                items.extend(crate::iter::collect(&value, &self.limits)?);
            } else {
                items.push(self.eval_expr(elt)?);
            }
        }
        Ok(items)
    }

    fn eval_compare(&mut self, left: ExprId, ops: &[CmpOp], comparators: &[ExprId]) -> EvalResult {
        let mut right = self.eval_expr(left)?;
        for (op, &comparator) in ops.iter().zip(comparators) {
            let left = right;
            right = self.eval_expr(comparator)?;
            if !self.compare_op(*op, &left, &right)? {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }

    fn eval_formatted(
        &mut self,
        value: ExprId,
        conversion: Option<Conversion>,
        format_spec: Option<ExprId>,
    ) -> EvalResult {
        let value = self.eval_expr(value)?;
        let value = match conversion {
            None => value,
            Some(Conversion::Str) => Value::string(value.to_str()),
            Some(Conversion::Repr) => Value::string(value.repr()),
            Some(Conversion::Ascii) => Value::string(ascii_repr(&value)),
        };
        let spec = match format_spec {
            Some(spec) => self.eval_expr(spec)?.to_str(),
            None => String::new(),
        };
        if spec.is_empty() {
            return Ok(Value::string(value.to_str()));
        }
        Ok(Value::string(format_value(&value, &spec, &self.limits)?))
    }

    fn eval_joined(&mut self, parts: &[ExprId]) -> EvalResult {
        let mut out = String::new();
        let mut length = 0;
        for &part in parts {
            let text = self.eval_expr(part)?.to_str();
            let len = text.chars().count();
            if length + len > self.limits.max_string_length {
                return Err(resource(
                    ResourceKind::ValueSize,
                    "Sorry, I will not evaluate something this long.",
                ));
            }
            length += len;
            out.push_str(&text);
        }
        Ok(Value::string(out))
    }
}

/// `{**mapping}` inside a dict display.
fn merge_mapping(dict: &mut Dict, value: &Value) -> EvalResult<()> {
    match value {
        Value::Dict(other) => {
            for (k, v) in other.borrow().iter() {
                dict.insert(k.clone(), v.clone())?;
            }
            Ok(())
        }
        other => Err(type_error(format!(
            "'{}' object is not a mapping",
            other.type_name()
        ))),
    }
}
