//! Parser tests.
//!
//! - `stmt_tests`: statements, blocks and layout errors
//! - `expr_tests`: precedence, displays, calls and targets
//! - `fstring_tests`: string concatenation and f-strings
//! - `walk_tests`: the whole-tree walk over parsed programs

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

mod fstring_tests;
mod stmt_tests;

use dys_ir::{Expr, ExprKind, Program, Stmt, StmtKind, StringInterner};

use crate::{parse, ParseError};

pub(crate) struct Parsed {
    pub program: Program,
    pub interner: StringInterner,
}

impl Parsed {
    pub fn stmt(&self, index: usize) -> &Stmt {
        self.program.arena.stmt(self.program.body[index])
    }

    pub fn expr(&self, id: dys_ir::ExprId) -> &Expr {
        self.program.arena.expr(id)
    }

    /// The expression of a single expression statement.
    pub fn only_expr(&self) -> &Expr {
        assert_eq!(self.program.body.len(), 1, "expected one statement");
        match &self.stmt(0).kind {
            StmtKind::Expr(id) => self.expr(*id),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    pub fn name(&self, text: &str) -> dys_ir::Name {
        self.interner.intern(text)
    }

    pub fn text(&self, kind: &ExprKind) -> String {
        match kind {
            ExprKind::Name(name) => self.interner.lookup(*name).to_string(),
            other => panic!("expected name, got {other:?}"),
        }
    }
}

pub(crate) fn parse_ok(source: &str) -> Parsed {
    let interner = StringInterner::new();
    match parse(source, &interner) {
        Ok(program) => Parsed { program, interner },
        Err(err) => panic!("parse failed for {source:?}: {err} at {:?}", err.span),
    }
}

pub(crate) fn parse_err(source: &str) -> ParseError {
    let interner = StringInterner::new();
    match parse(source, &interner) {
        Ok(_) => panic!("expected a syntax error for {source:?}"),
        Err(err) => err,
    }
}
