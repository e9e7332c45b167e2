//! Recursive descent parser for Dys.
//!
//! Produces a flat [`Program`] whose nodes live in an `ExprArena`. The
//! grammar is a Python 3.8 subset; constructs the evaluator does not run
//! (`with`, `async`, `yield`, `global`, ...) are still parsed so that the
//! validator can reject them with their position.

mod cursor;
mod error;
mod grammar;

pub use cursor::Cursor;
pub use error::ParseError;

use dys_ir::{
    Expr, ExprArena, ExprId, ExprKind, Program, Span, Stmt, StmtId, StmtKind, StringInterner,
    TokenKind,
};
use dys_stack::{ensure_sufficient_stack, NestingBudget};
use tracing::debug;

/// Deepest nesting of brackets, unary operators and blocks accepted.
const MAX_NESTING: u32 = 200;

/// Lex and parse a whole program.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str, interner: &StringInterner) -> Result<Program, ParseError> {
    let tokens = dys_lexer::lex(source, interner)?;
    let mut parser = Parser::new(source, Cursor::new(tokens), interner);
    let body = parser.parse_module()?;
    debug!(
        stmts = parser.arena.stmt_count(),
        exprs = parser.arena.expr_count(),
        "parsed program"
    );
    Ok(Program::new(parser.arena, body, source))
}

/// Parser state.
pub struct Parser<'a> {
    source: &'a str,
    cursor: Cursor,
    interner: &'a StringInterner,
    arena: ExprArena,
    nesting: NestingBudget,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, cursor: Cursor, interner: &'a StringInterner) -> Self {
        Parser {
            source,
            cursor,
            interner,
            arena: ExprArena::new(),
            nesting: NestingBudget::new(MAX_NESTING),
        }
    }

    #[inline]
    fn current_kind(&self) -> TokenKind {
        self.cursor.current_kind()
    }

    #[inline]
    fn current_span(&self) -> Span {
        self.cursor.current_span()
    }

    #[inline]
    fn check(&self, kind: TokenKind) -> bool {
        self.cursor.check(kind)
    }

    #[inline]
    fn eat(&mut self, kind: TokenKind) -> bool {
        self.cursor.eat(kind)
    }

    #[inline]
    fn expect(&mut self, kind: TokenKind) -> Result<Span, ParseError> {
        self.cursor.expect(kind).map(|t| t.span)
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.cursor.last_end().max(start.end))
    }

    fn alloc_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc_expr(Expr { kind, span })
    }

    fn alloc_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        self.arena.alloc_stmt(Stmt { kind, span })
    }

    fn expr_span(&self, id: ExprId) -> Span {
        self.arena.expr(id).span
    }

    /// Run one level of a recursive rule under the nesting budget.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if let Err(too_deep) = self.nesting.enter() {
            return Err(ParseError::new(
                format!("too many nested expressions or blocks (limit {})", too_deep.limit),
                self.current_span(),
            ));
        }
        let result = ensure_sufficient_stack(|| f(self));
        self.nesting.exit();
        result
    }

    fn parse_module(&mut self) -> Result<Vec<StmtId>, ParseError> {
        let mut body = Vec::new();
        while !self.cursor.is_at_end() {
            if self.eat(TokenKind::Newline) {
                continue;
            }
            self.parse_statement(&mut body)?;
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests;
