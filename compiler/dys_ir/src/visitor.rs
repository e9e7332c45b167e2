//! Whole-tree node walk.
//!
//! Walks every element of a program (statements, expressions, operators,
//! contexts and helper nodes) in pre-order and reports each one's kind and
//! span. Elements without a position of their own (operators, contexts)
//! report their parent's span. The walk stops as soon as the visitor breaks.

use std::ops::ControlFlow;

use crate::ast::{Comprehension, ExprKind, NodeKind, Parameters, StmtKind};
use crate::{ExprArena, ExprId, Program, Span, StmtId};

/// Receives every node of a walk.
pub trait NodeVisitor {
    type Break;

    fn visit_node(&mut self, kind: NodeKind, span: Span) -> ControlFlow<Self::Break>;
}

/// Walk a whole program, starting with its `Module` root.
pub fn walk_program<V: NodeVisitor>(visitor: &mut V, program: &Program) -> ControlFlow<V::Break> {
    visitor.visit_node(NodeKind::Module, program.span)?;
    walk_body(visitor, &program.arena, &program.body)
}

fn walk_body<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    body: &[StmtId],
) -> ControlFlow<V::Break> {
    for &stmt in body {
        walk_stmt(visitor, arena, stmt)?;
    }
    ControlFlow::Continue(())
}

fn walk_opt<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    expr: Option<ExprId>,
) -> ControlFlow<V::Break> {
    match expr {
        Some(expr) => walk_expr(visitor, arena, expr, NodeKind::Load),
        None => ControlFlow::Continue(()),
    }
}

fn walk_exprs<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    exprs: &[ExprId],
    ctx: NodeKind,
) -> ControlFlow<V::Break> {
    for &expr in exprs {
        walk_expr(visitor, arena, expr, ctx)?;
    }
    ControlFlow::Continue(())
}

fn walk_params<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    params: &Parameters,
    span: Span,
) -> ControlFlow<V::Break> {
    visitor.visit_node(NodeKind::Arguments, span)?;
    for param in params.iter() {
        visitor.visit_node(NodeKind::Arg, param.span)?;
        walk_opt(visitor, arena, param.annotation)?;
        walk_opt(visitor, arena, param.default)?;
    }
    ControlFlow::Continue(())
}

fn walk_generators<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    generators: &[Comprehension],
    span: Span,
) -> ControlFlow<V::Break> {
    for generator in generators {
        visitor.visit_node(NodeKind::Comprehension, span)?;
        walk_expr(visitor, arena, generator.target, NodeKind::Store)?;
        walk_expr(visitor, arena, generator.iter, NodeKind::Load)?;
        walk_exprs(visitor, arena, &generator.ifs, NodeKind::Load)?;
    }
    ControlFlow::Continue(())
}

/// Walk one statement and everything below it.
pub fn walk_stmt<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    id: StmtId,
) -> ControlFlow<V::Break> {
    let stmt = arena.stmt(id);
    let span = stmt.span;
    visitor.visit_node(stmt.kind.node_kind(), span)?;
    match &stmt.kind {
        StmtKind::Expr(value) => walk_expr(visitor, arena, *value, NodeKind::Load),
        StmtKind::Assign { targets, value } => {
            walk_exprs(visitor, arena, targets, NodeKind::Store)?;
            walk_expr(visitor, arena, *value, NodeKind::Load)
        }
        StmtKind::AugAssign { target, op, value } => {
            walk_expr(visitor, arena, *target, NodeKind::Store)?;
            visitor.visit_node(op.node_kind(), span)?;
            walk_expr(visitor, arena, *value, NodeKind::Load)
        }
        StmtKind::AnnAssign {
            target,
            annotation,
            value,
        } => {
            walk_expr(visitor, arena, *target, NodeKind::Store)?;
            walk_expr(visitor, arena, *annotation, NodeKind::Load)?;
            walk_opt(visitor, arena, *value)
        }
        StmtKind::Pass
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Global(_)
        | StmtKind::Nonlocal(_) => ControlFlow::Continue(()),
        StmtKind::Return(value) => walk_opt(visitor, arena, *value),
        StmtKind::Raise { exc, cause } => {
            walk_opt(visitor, arena, *exc)?;
            walk_opt(visitor, arena, *cause)
        }
        StmtKind::Assert { test, msg } => {
            walk_expr(visitor, arena, *test, NodeKind::Load)?;
            walk_opt(visitor, arena, *msg)
        }
        StmtKind::Delete(targets) => walk_exprs(visitor, arena, targets, NodeKind::Del),
        StmtKind::Import(names) | StmtKind::ImportFrom { names, .. } => {
            for alias in names {
                visitor.visit_node(NodeKind::Alias, alias.span)?;
            }
            ControlFlow::Continue(())
        }
        StmtKind::If { test, body, orelse } | StmtKind::While { test, body, orelse } => {
            walk_expr(visitor, arena, *test, NodeKind::Load)?;
            walk_body(visitor, arena, body)?;
            walk_body(visitor, arena, orelse)
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => {
            walk_expr(visitor, arena, *target, NodeKind::Store)?;
            walk_expr(visitor, arena, *iter, NodeKind::Load)?;
            walk_body(visitor, arena, body)?;
            walk_body(visitor, arena, orelse)
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            walk_body(visitor, arena, body)?;
            for handler in handlers {
                visitor.visit_node(NodeKind::ExceptHandler, handler.span)?;
                walk_opt(visitor, arena, handler.ty)?;
                walk_body(visitor, arena, &handler.body)?;
            }
            walk_body(visitor, arena, orelse)?;
            walk_body(visitor, arena, finalbody)
        }
        StmtKind::With { items, body } => {
            for item in items {
                visitor.visit_node(NodeKind::WithItem, span)?;
                walk_expr(visitor, arena, item.context, NodeKind::Load)?;
                if let Some(vars) = item.vars {
                    walk_expr(visitor, arena, vars, NodeKind::Store)?;
                }
            }
            walk_body(visitor, arena, body)
        }
        StmtKind::FunctionDef(def) => {
            walk_exprs(visitor, arena, &def.decorators, NodeKind::Load)?;
            walk_params(visitor, arena, &def.params, span)?;
            walk_opt(visitor, arena, def.returns)?;
            walk_body(visitor, arena, &def.body)
        }
        StmtKind::ClassDef(def) => {
            walk_exprs(visitor, arena, &def.decorators, NodeKind::Load)?;
            walk_exprs(visitor, arena, &def.bases, NodeKind::Load)?;
            for keyword in &def.keywords {
                visitor.visit_node(NodeKind::Keyword, keyword.span)?;
                walk_expr(visitor, arena, keyword.value, NodeKind::Load)?;
            }
            walk_body(visitor, arena, &def.body)
        }
        StmtKind::Async { stmt, .. } => {
            // The async node itself was reported above; its payload's own
            // kind is not reported again.
            let inner = arena.stmt(*stmt);
            match &inner.kind {
                StmtKind::FunctionDef(def) => {
                    walk_exprs(visitor, arena, &def.decorators, NodeKind::Load)?;
                    walk_params(visitor, arena, &def.params, span)?;
                    walk_body(visitor, arena, &def.body)
                }
                StmtKind::For {
                    target,
                    iter,
                    body,
                    orelse,
                } => {
                    walk_expr(visitor, arena, *target, NodeKind::Store)?;
                    walk_expr(visitor, arena, *iter, NodeKind::Load)?;
                    walk_body(visitor, arena, body)?;
                    walk_body(visitor, arena, orelse)
                }
                StmtKind::With { items, body } => {
                    for item in items {
                        walk_expr(visitor, arena, item.context, NodeKind::Load)?;
                    }
                    walk_body(visitor, arena, body)
                }
                _ => ControlFlow::Continue(()),
            }
        }
    }
}

/// Walk one expression in the given context (`Load`, `Store`, `Del`).
pub fn walk_expr<V: NodeVisitor>(
    visitor: &mut V,
    arena: &ExprArena,
    id: ExprId,
    ctx: NodeKind,
) -> ControlFlow<V::Break> {
    let expr = arena.expr(id);
    let span = expr.span;
    visitor.visit_node(expr.kind.node_kind(), span)?;
    match &expr.kind {
        ExprKind::Constant(_) => ControlFlow::Continue(()),
        ExprKind::Name(_) => visitor.visit_node(ctx, span),
        ExprKind::BoolOp { op, values } => {
            visitor.visit_node(op.node_kind(), span)?;
            walk_exprs(visitor, arena, values, NodeKind::Load)
        }
        ExprKind::NamedExpr { value, .. } => {
            visitor.visit_node(NodeKind::Name, span)?;
            visitor.visit_node(NodeKind::Store, span)?;
            walk_expr(visitor, arena, *value, NodeKind::Load)
        }
        ExprKind::BinOp { left, op, right } => {
            walk_expr(visitor, arena, *left, NodeKind::Load)?;
            visitor.visit_node(op.node_kind(), span)?;
            walk_expr(visitor, arena, *right, NodeKind::Load)
        }
        ExprKind::UnaryOp { op, operand } => {
            visitor.visit_node(op.node_kind(), span)?;
            walk_expr(visitor, arena, *operand, NodeKind::Load)
        }
        ExprKind::Lambda { params, body } => {
            walk_params(visitor, arena, params, span)?;
            walk_expr(visitor, arena, *body, NodeKind::Load)
        }
        ExprKind::IfExp { test, body, orelse } => {
            walk_expr(visitor, arena, *test, NodeKind::Load)?;
            walk_expr(visitor, arena, *body, NodeKind::Load)?;
            walk_expr(visitor, arena, *orelse, NodeKind::Load)
        }
        ExprKind::Dict(entries) => {
            for entry in entries {
                walk_opt(visitor, arena, entry.key)?;
                walk_expr(visitor, arena, entry.value, NodeKind::Load)?;
            }
            ControlFlow::Continue(())
        }
        ExprKind::Set(elts) => walk_exprs(visitor, arena, elts, NodeKind::Load),
        ExprKind::ListComp { elt, generators }
        | ExprKind::SetComp { elt, generators }
        | ExprKind::GeneratorExp { elt, generators } => {
            walk_expr(visitor, arena, *elt, NodeKind::Load)?;
            walk_generators(visitor, arena, generators, span)
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            walk_expr(visitor, arena, *key, NodeKind::Load)?;
            walk_expr(visitor, arena, *value, NodeKind::Load)?;
            walk_generators(visitor, arena, generators, span)
        }
        ExprKind::Await(value) | ExprKind::YieldFrom(value) => {
            walk_expr(visitor, arena, *value, NodeKind::Load)
        }
        ExprKind::Yield(value) => walk_opt(visitor, arena, *value),
        ExprKind::Compare {
            left,
            ops,
            comparators,
        } => {
            walk_expr(visitor, arena, *left, NodeKind::Load)?;
            for op in ops {
                visitor.visit_node(op.node_kind(), span)?;
            }
            walk_exprs(visitor, arena, comparators, NodeKind::Load)
        }
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            walk_expr(visitor, arena, *func, NodeKind::Load)?;
            walk_exprs(visitor, arena, args, NodeKind::Load)?;
            for keyword in keywords {
                visitor.visit_node(NodeKind::Keyword, keyword.span)?;
                walk_expr(visitor, arena, keyword.value, NodeKind::Load)?;
            }
            ControlFlow::Continue(())
        }
        ExprKind::FormattedValue {
            value, format_spec, ..
        } => {
            walk_expr(visitor, arena, *value, NodeKind::Load)?;
            walk_opt(visitor, arena, *format_spec)
        }
        ExprKind::JoinedStr(parts) => walk_exprs(visitor, arena, parts, NodeKind::Load),
        ExprKind::Attribute { value, .. } => {
            walk_expr(visitor, arena, *value, NodeKind::Load)?;
            visitor.visit_node(ctx, span)
        }
        ExprKind::Subscript { value, slice } => {
            walk_expr(visitor, arena, *value, NodeKind::Load)?;
            walk_expr(visitor, arena, *slice, NodeKind::Load)?;
            visitor.visit_node(ctx, span)
        }
        ExprKind::Starred(value) => {
            walk_expr(visitor, arena, *value, ctx)?;
            visitor.visit_node(ctx, span)
        }
        ExprKind::List(elts) | ExprKind::Tuple(elts) => {
            walk_exprs(visitor, arena, elts, ctx)?;
            visitor.visit_node(ctx, span)
        }
        ExprKind::Slice { lower, upper, step } => {
            walk_opt(visitor, arena, *lower)?;
            walk_opt(visitor, arena, *upper)?;
            walk_opt(visitor, arena, *step)
        }
    }
}
