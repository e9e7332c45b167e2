//! Arena storage for statements and expressions, and the parsed `Program`.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::ast::{Expr, Stmt};
use crate::{LineIndex, SourceRange, Span};

/// Index into the expression arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Index into the statement arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        StmtId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

/// Contiguous storage for all nodes of one program.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(u32::try_from(self.stmts.len()).unwrap_or(u32::MAX));
        self.stmts.push(stmt);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }
}

/// Process-unique identity of a parsed program.
///
/// Definition sites of script callables are keyed by `(ProgramId, node)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

impl ProgramId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        ProgramId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A parsed program: the module body plus everything needed to report
/// positions for its nodes.
#[derive(Debug)]
pub struct Program {
    pub id: ProgramId,
    pub arena: ExprArena,
    pub body: Vec<crate::StmtId>,
    pub span: Span,
    pub lines: LineIndex,
}

impl Program {
    pub fn new(arena: ExprArena, body: Vec<StmtId>, source: &str) -> Self {
        Program {
            id: ProgramId::fresh(),
            arena,
            body,
            span: Span::from_range(0..source.len()),
            lines: LineIndex::new(source),
        }
    }

    /// Line/column range of a span in this program.
    #[inline]
    pub fn locate(&self, span: Span) -> SourceRange {
        self.lines.locate(span)
    }
}

/// Shared handle to a parsed program.
///
/// Function values keep their defining program alive through this handle so
/// their bodies can run (and report positions) after the defining evaluation
/// has moved on.
#[derive(Clone, Debug)]
pub struct SharedProgram(Arc<Program>);

impl SharedProgram {
    pub fn new(program: Program) -> Self {
        SharedProgram(Arc::new(program))
    }

    /// Whether both handles point at the same program.
    pub fn same(&self, other: &SharedProgram) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for SharedProgram {
    type Target = Program;

    fn deref(&self) -> &Program {
        &self.0
    }
}
