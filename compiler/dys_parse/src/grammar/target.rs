//! Assignment and deletion target checks.

use dys_ir::{ExprId, ExprKind};

use crate::{ParseError, Parser};

/// Where a target expression appears.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TargetContext {
    /// `=`, `for`, comprehension and `with ... as` targets.
    Assign,
    /// `x += ...`
    Augmented,
    /// `x: T = ...`
    Annotated,
    /// `del x`
    Delete,
}

fn describe(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Constant(_) | ExprKind::JoinedStr(_) | ExprKind::FormattedValue { .. } => {
            "literal"
        }
        ExprKind::Call { .. } => "function call",
        ExprKind::BinOp { .. } | ExprKind::UnaryOp { .. } | ExprKind::BoolOp { .. } => {
            "operator"
        }
        ExprKind::Compare { .. } => "comparison",
        ExprKind::Lambda { .. } => "lambda",
        ExprKind::IfExp { .. } => "conditional expression",
        ExprKind::NamedExpr { .. } => "named expression",
        ExprKind::ListComp { .. } => "list comprehension",
        ExprKind::SetComp { .. } => "set comprehension",
        ExprKind::DictComp { .. } => "dict comprehension",
        ExprKind::GeneratorExp { .. } => "generator expression",
        ExprKind::Dict(_) => "dict display",
        ExprKind::Set(_) => "set display",
        ExprKind::Await(_) => "await expression",
        ExprKind::Yield(_) | ExprKind::YieldFrom(_) => "yield expression",
        ExprKind::Starred(_) => "starred",
        ExprKind::Slice { .. } => "slice",
        ExprKind::Tuple(_) => "tuple",
        ExprKind::List(_) => "list",
        ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => {
            "expression"
        }
    }
}

impl Parser<'_> {
    pub(crate) fn check_target(&self, id: ExprId, ctx: TargetContext) -> Result<(), ParseError> {
        let expr = self.arena.expr(id);
        match (&expr.kind, ctx) {
            (ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }, _) => {
                Ok(())
            }
            (ExprKind::Tuple(_) | ExprKind::List(_), TargetContext::Augmented) => Err(
                ParseError::new("illegal expression for augmented assignment", expr.span),
            ),
            (ExprKind::Tuple(_) | ExprKind::List(_), TargetContext::Annotated) => Err(
                ParseError::new("only single target (not tuple) can be annotated", expr.span),
            ),
            (ExprKind::Tuple(elts) | ExprKind::List(elts), _) => {
                let mut starred = 0;
                for &elt in elts {
                    if let ExprKind::Starred(_) = self.arena.expr(elt).kind {
                        starred += 1;
                    }
                    self.check_target(elt, ctx)?;
                }
                if starred > 1 {
                    return Err(ParseError::new(
                        "multiple starred expressions in assignment",
                        expr.span,
                    ));
                }
                Ok(())
            }
            (ExprKind::Starred(inner), TargetContext::Assign) => {
                self.check_target(*inner, ctx)
            }
            (kind, TargetContext::Delete) => Err(ParseError::new(
                format!("cannot delete {}", describe(kind)),
                expr.span,
            )),
            (kind, TargetContext::Augmented) => Err(ParseError::new(
                format!("'{}' is an illegal expression for augmented assignment", describe(kind)),
                expr.span,
            )),
            (kind, _) => Err(ParseError::new(
                format!("cannot assign to {}", describe(kind)),
                expr.span,
            )),
        }
    }
}
