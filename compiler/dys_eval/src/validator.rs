//! Grammar validation.
//!
//! One pass over a parsed program, before anything runs. The first node
//! the evaluator cannot run fails the whole program with its position, so
//! a rejected script has no side effects.

use std::ops::ControlFlow;

use rustc_hash::FxHashSet;

use dys_ir::visitor::{walk_program, NodeVisitor};
use dys_ir::{NodeKind, Program, Span};

use crate::errors::{not_implemented, EvalError};

/// Whether the evaluator runs (or silently accepts) nodes of `kind`.
pub fn is_supported(kind: NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::With
            | NodeKind::AsyncWith
            | NodeKind::WithItem
            | NodeKind::AsyncFunctionDef
            | NodeKind::AsyncFor
            | NodeKind::Global
            | NodeKind::Nonlocal
            | NodeKind::Await
            | NodeKind::Yield
            | NodeKind::YieldFrom
            | NodeKind::MatMult
    )
}

struct Validator<'p> {
    program: &'p Program,
    attributes: FxHashSet<Span>,
}

impl NodeVisitor for Validator<'_> {
    type Break = EvalError;

    fn visit_node(&mut self, kind: NodeKind, span: Span) -> ControlFlow<EvalError> {
        let error = if !is_supported(kind) {
            not_implemented(format!(
                "Sorry, {} is not available in this evaluator",
                kind.name()
            ))
        } else if kind == NodeKind::Del && self.attributes.contains(&span) {
            not_implemented("Sorry, cannot delete Attribute")
        } else {
            if kind == NodeKind::Attribute {
                self.attributes.insert(span);
            }
            return ControlFlow::Continue(());
        };
        let program = self.program;
        ControlFlow::Break(error.located(|| program.locate(span)))
    }
}

/// Check that every node of `program` can be evaluated.
#[tracing::instrument(level = "debug", skip_all)]
pub fn validate(program: &Program) -> Result<(), EvalError> {
    let mut validator = Validator {
        program,
        attributes: FxHashSet::default(),
    };
    match walk_program(&mut validator, program) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(err) => Err(err),
    }
}
