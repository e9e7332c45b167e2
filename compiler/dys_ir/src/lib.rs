//! Dys IR - source representation types.
//!
//! This crate contains the data structures shared by the lexer, parser and
//! evaluator:
//! - Spans and line/column conversion
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - The arena AST (`Expr`, `Stmt`, `Program`)
//! - A whole-tree walk used by validation and coverage
//!
//! # Design Philosophy
//!
//! - **Intern identifiers**: identifier text becomes `Name(u32)`
//! - **Flatten the tree**: no `Box<Expr>` children, use `ExprId(u32)` indices
//! - **Parse more than we run**: unsupported constructs still get nodes so
//!   they can be rejected with a precise position

mod arena;
pub mod ast;
mod interner;
mod span;
mod token;
pub mod visitor;

pub use arena::{ExprArena, ExprId, Program, ProgramId, SharedProgram, StmtId};
pub use ast::{
    Alias, AsyncKind, BinaryOp, BoolOp, ClassDef, CmpOp, Comprehension, Constant, Conversion,
    DictEntry, ExceptHandler, Expr, ExprKind, FunctionDef, Keyword, NodeKind, Param, Parameters,
    Stmt, StmtKind, UnaryOp, WithItem,
};
pub use interner::{Name, SharedInterner, StringInterner};
pub use span::{LineIndex, SourceRange, Span};
pub use token::{StrPrefix, StrToken, Token, TokenKind, TokenList};
