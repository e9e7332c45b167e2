//! Statements and indented blocks.

use dys_ir::{
    Alias, AsyncKind, BinaryOp, ClassDef, ExceptHandler, ExprId, ExprKind, FunctionDef, Span,
    StmtId, StmtKind, TokenKind, WithItem,
};

use crate::grammar::target::TargetContext;
use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Parse one statement line (or compound statement) into `out`.
    pub(crate) fn parse_statement(&mut self, out: &mut Vec<StmtId>) -> Result<(), ParseError> {
        match self.current_kind() {
            TokenKind::If => out.push(self.parse_if()?),
            TokenKind::While => out.push(self.parse_while()?),
            TokenKind::For => out.push(self.parse_for()?),
            TokenKind::Try => out.push(self.parse_try()?),
            TokenKind::With => out.push(self.parse_with()?),
            TokenKind::Def => out.push(self.parse_def(Vec::new(), None)?),
            TokenKind::Class => out.push(self.parse_class(Vec::new(), None)?),
            TokenKind::At => out.push(self.parse_decorated()?),
            TokenKind::Async => out.push(self.parse_async(Vec::new(), None)?),
            TokenKind::Indent => return Err(ParseError::new("unexpected indent", self.current_span())),
            TokenKind::Dedent => {
                return Err(ParseError::new(
                    "unindent does not match any outer indentation level",
                    self.current_span(),
                ))
            }
            _ => self.parse_simple_line(out)?,
        }
        Ok(())
    }

    /// `small_stmt (';' small_stmt)* [';'] NEWLINE`
    fn parse_simple_line(&mut self, out: &mut Vec<StmtId>) -> Result<(), ParseError> {
        loop {
            out.push(self.parse_small_statement()?);
            if !self.eat(TokenKind::Semi) {
                break;
            }
            if self.check(TokenKind::Newline) || self.cursor.is_at_end() {
                break;
            }
        }
        if !self.eat(TokenKind::Newline) && !self.cursor.is_at_end() {
            return Err(ParseError::invalid_syntax(self.current_span()));
        }
        Ok(())
    }

    fn parse_small_statement(&mut self) -> Result<StmtId, ParseError> {
        let start = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Pass => {
                self.cursor.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                self.cursor.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.cursor.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.cursor.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_star_expressions()?)
                };
                StmtKind::Return(value)
            }
            TokenKind::Raise => {
                self.cursor.advance();
                let mut exc = None;
                let mut cause = None;
                if !self.at_statement_end() {
                    exc = Some(self.parse_test()?);
                    if self.eat(TokenKind::From) {
                        cause = Some(self.parse_test()?);
                    }
                }
                StmtKind::Raise { exc, cause }
            }
            TokenKind::Assert => {
                self.cursor.advance();
                let test = self.parse_test()?;
                let msg = if self.eat(TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            TokenKind::Del => {
                self.cursor.advance();
                let mut targets = Vec::new();
                loop {
                    let target = self.parse_bitor()?;
                    self.check_target(target, TargetContext::Delete)?;
                    targets.push(target);
                    if !self.eat(TokenKind::Comma) || self.at_statement_end() {
                        break;
                    }
                }
                StmtKind::Delete(targets)
            }
            TokenKind::Import => {
                self.cursor.advance();
                StmtKind::Import(self.parse_import_names()?)
            }
            TokenKind::From => {
                self.cursor.advance();
                self.parse_import_from()?
            }
            TokenKind::Global | TokenKind::Nonlocal => {
                let global = self.current_kind() == TokenKind::Global;
                self.cursor.advance();
                let mut names = vec![self.parse_name()?.0];
                while self.eat(TokenKind::Comma) {
                    names.push(self.parse_name()?.0);
                }
                if global {
                    StmtKind::Global(names)
                } else {
                    StmtKind::Nonlocal(names)
                }
            }
            _ => self.parse_expression_statement()?,
        };
        Ok(self.alloc_stmt(kind, self.span_from(start)))
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semi | TokenKind::Eof
        )
    }

    /// Expression statement, assignment, augmented or annotated assignment.
    fn parse_expression_statement(&mut self) -> Result<StmtKind, ParseError> {
        let first = self.parse_star_expressions_or_yield()?;

        if self.check(TokenKind::Colon) {
            self.cursor.advance();
            self.check_target(first, TargetContext::Annotated)?;
            let annotation = self.parse_test()?;
            let value = if self.eat(TokenKind::Assign) {
                Some(self.parse_star_expressions_or_yield()?)
            } else {
                None
            };
            return Ok(StmtKind::AnnAssign {
                target: first,
                annotation,
                value,
            });
        }

        if let Some(op) = self.match_augmented_op() {
            self.cursor.advance();
            self.check_target(first, TargetContext::Augmented)?;
            let value = self.parse_star_expressions_or_yield()?;
            return Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if self.check(TokenKind::Assign) {
            let mut targets = vec![first];
            let mut value = first;
            while self.eat(TokenKind::Assign) {
                value = self.parse_star_expressions_or_yield()?;
                targets.push(value);
            }
            targets.pop();
            for &target in &targets {
                self.check_target(target, TargetContext::Assign)?;
            }
            return Ok(StmtKind::Assign { targets, value });
        }

        if let ExprKind::Starred(_) = self.arena.expr(first).kind {
            return Err(ParseError::new(
                "can't use starred expression here",
                self.expr_span(first),
            ));
        }
        Ok(StmtKind::Expr(first))
    }

    fn parse_star_expressions_or_yield(&mut self) -> Result<ExprId, ParseError> {
        if self.check(TokenKind::Yield) {
            self.parse_yield()
        } else {
            self.parse_star_expressions()
        }
    }

    fn match_augmented_op(&self) -> Option<BinaryOp> {
        Some(match self.current_kind() {
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mult,
            TokenKind::SlashEq => BinaryOp::Div,
            TokenKind::DoubleSlashEq => BinaryOp::FloorDiv,
            TokenKind::PercentEq => BinaryOp::Mod,
            TokenKind::DoubleStarEq => BinaryOp::Pow,
            TokenKind::AtEq => BinaryOp::MatMult,
            TokenKind::AmpEq => BinaryOp::BitAnd,
            TokenKind::PipeEq => BinaryOp::BitOr,
            TokenKind::CaretEq => BinaryOp::BitXor,
            TokenKind::LShiftEq => BinaryOp::LShift,
            TokenKind::RShiftEq => BinaryOp::RShift,
            _ => return None,
        })
    }

    /// `dotted_name ['as' NAME] (',' ...)*`
    fn parse_import_names(&mut self) -> Result<Vec<Alias>, ParseError> {
        let mut names = Vec::new();
        loop {
            let start = self.current_span();
            let name = self.parse_dotted_name()?;
            let asname = if self.eat(TokenKind::As) {
                Some(self.parse_name()?.0)
            } else {
                None
            };
            names.push(Alias {
                name,
                asname,
                span: self.span_from(start),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(names)
    }

    fn parse_import_from(&mut self) -> Result<StmtKind, ParseError> {
        if matches!(self.current_kind(), TokenKind::Dot | TokenKind::Ellipsis) {
            return Err(ParseError::new(
                "relative imports are not supported",
                self.current_span(),
            ));
        }
        let module = self.parse_dotted_name()?;
        self.expect(TokenKind::Import)?;

        if self.check(TokenKind::Star) {
            let span = self.cursor.advance().span;
            let star = self.interner.intern("*");
            return Ok(StmtKind::ImportFrom {
                module,
                names: vec![Alias {
                    name: star,
                    asname: None,
                    span,
                }],
            });
        }

        let parenthesized = self.eat(TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let start = self.current_span();
            let (name, _) = self.parse_name()?;
            let asname = if self.eat(TokenKind::As) {
                Some(self.parse_name()?.0)
            } else {
                None
            };
            names.push(Alias {
                name,
                asname,
                span: self.span_from(start),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
            if parenthesized && self.check(TokenKind::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect(TokenKind::RParen)?;
        }
        Ok(StmtKind::ImportFrom { module, names })
    }

    /// `NAME ('.' NAME)*`, interned as one dotted name.
    fn parse_dotted_name(&mut self) -> Result<dys_ir::Name, ParseError> {
        let (first, _) = self.parse_name()?;
        if !self.check(TokenKind::Dot) {
            return Ok(first);
        }
        let mut dotted = self.interner.lookup(first).to_string();
        while self.eat(TokenKind::Dot) {
            let (part, _) = self.parse_name()?;
            dotted.push('.');
            dotted.push_str(&self.interner.lookup(part));
        }
        Ok(self.interner.intern(&dotted))
    }

    // Compound statements

    /// `':' (simple_line | NEWLINE INDENT statement+ DEDENT)`
    pub(crate) fn parse_block(&mut self) -> Result<Vec<StmtId>, ParseError> {
        self.expect(TokenKind::Colon)?;
        self.nested(|p| {
            let mut body = Vec::new();
            if !p.eat(TokenKind::Newline) {
                p.parse_simple_line(&mut body)?;
                return Ok(body);
            }
            if !p.eat(TokenKind::Indent) {
                return Err(ParseError::new(
                    "expected an indented block",
                    p.current_span(),
                ));
            }
            while !p.eat(TokenKind::Dedent) {
                if p.cursor.is_at_end() {
                    break;
                }
                p.parse_statement(&mut body)?;
            }
            Ok(body)
        })
    }

    fn parse_if(&mut self) -> Result<StmtId, ParseError> {
        let start = self.cursor.advance().span;
        let test = self.parse_named_expr()?;
        let body = self.parse_block()?;
        let orelse = match self.current_kind() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.cursor.advance();
                self.parse_block()?
            }
            _ => Vec::new(),
        };
        Ok(self.alloc_stmt(StmtKind::If { test, body, orelse }, self.span_from(start)))
    }

    fn parse_else_block(&mut self) -> Result<Vec<StmtId>, ParseError> {
        if self.eat(TokenKind::Else) {
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> Result<StmtId, ParseError> {
        let start = self.cursor.advance().span;
        let test = self.parse_named_expr()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        Ok(self.alloc_stmt(StmtKind::While { test, body, orelse }, self.span_from(start)))
    }

    fn parse_for(&mut self) -> Result<StmtId, ParseError> {
        let start = self.cursor.advance().span;
        let target = self.parse_target_list()?;
        self.check_target(target, TargetContext::Assign)?;
        self.expect(TokenKind::In)?;
        let iter = self.parse_star_expressions()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        Ok(self.alloc_stmt(
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            },
            self.span_from(start),
        ))
    }

    fn parse_try(&mut self) -> Result<StmtId, ParseError> {
        let start = self.cursor.advance().span;
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        while self.check(TokenKind::Except) {
            let handler_start = self.cursor.advance().span;
            let mut ty = None;
            let mut name = None;
            if !self.check(TokenKind::Colon) {
                ty = Some(self.parse_test()?);
                if self.eat(TokenKind::As) {
                    name = Some(self.parse_name()?.0);
                }
            }
            let handler_body = self.parse_block()?;
            handlers.push(ExceptHandler {
                ty,
                name,
                body: handler_body,
                span: self.span_from(handler_start),
            });
        }
        for handler in handlers.iter().rev().skip(1) {
            if handler.ty.is_none() {
                return Err(ParseError::new(
                    "default 'except:' must be last",
                    handler.span,
                ));
            }
        }

        let orelse = if handlers.is_empty() {
            Vec::new()
        } else {
            self.parse_else_block()?
        };
        let finalbody = if self.eat(TokenKind::Finally) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            return Err(ParseError::new(
                "expected 'except' or 'finally' block",
                self.current_span(),
            ));
        }
        Ok(self.alloc_stmt(
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            self.span_from(start),
        ))
    }

    fn parse_with(&mut self) -> Result<StmtId, ParseError> {
        let start = self.cursor.advance().span;
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let vars = if self.eat(TokenKind::As) {
                let target = self.parse_bitor()?;
                self.check_target(target, TargetContext::Assign)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, vars });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let body = self.parse_block()?;
        Ok(self.alloc_stmt(StmtKind::With { items, body }, self.span_from(start)))
    }

    fn parse_decorated(&mut self) -> Result<StmtId, ParseError> {
        let start = self.current_span();
        let mut decorators = Vec::new();
        while self.eat(TokenKind::At) {
            decorators.push(self.parse_named_expr()?);
            self.expect(TokenKind::Newline)?;
        }
        match self.current_kind() {
            TokenKind::Def => self.parse_def(decorators, Some(start)),
            TokenKind::Class => self.parse_class(decorators, Some(start)),
            TokenKind::Async => self.parse_async(decorators, Some(start)),
            found => Err(ParseError::expected(
                "'def' or 'class' after decorator",
                found,
                self.current_span(),
            )),
        }
    }

    fn parse_async(
        &mut self,
        decorators: Vec<ExprId>,
        decorated_start: Option<Span>,
    ) -> Result<StmtId, ParseError> {
        let async_span = self.cursor.advance().span;
        let start = decorated_start.unwrap_or(async_span);
        let (kind, stmt) = match self.current_kind() {
            TokenKind::Def => (AsyncKind::FunctionDef, self.parse_def(decorators, Some(start))?),
            TokenKind::For if decorators.is_empty() => (AsyncKind::For, self.parse_for()?),
            TokenKind::With if decorators.is_empty() => (AsyncKind::With, self.parse_with()?),
            found => {
                return Err(ParseError::expected(
                    "'def', 'for' or 'with' after 'async'",
                    found,
                    self.current_span(),
                ))
            }
        };
        Ok(self.alloc_stmt(StmtKind::Async { kind, stmt }, self.span_from(start)))
    }

    fn parse_def(
        &mut self,
        decorators: Vec<ExprId>,
        decorated_start: Option<Span>,
    ) -> Result<StmtId, ParseError> {
        let def_span = self.cursor.advance().span;
        let start = decorated_start.unwrap_or(def_span);
        let (name, _) = self.parse_name()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters(TokenKind::RParen, true)?;
        self.expect(TokenKind::RParen)?;
        let returns = if self.eat(TokenKind::Arrow) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let def = FunctionDef {
            name,
            params,
            body,
            decorators,
            returns,
        };
        Ok(self.alloc_stmt(StmtKind::FunctionDef(Box::new(def)), self.span_from(start)))
    }

    fn parse_class(
        &mut self,
        decorators: Vec<ExprId>,
        decorated_start: Option<Span>,
    ) -> Result<StmtId, ParseError> {
        let class_span = self.cursor.advance().span;
        let start = decorated_start.unwrap_or(class_span);
        let (name, _) = self.parse_name()?;
        let (bases, keywords) = if self.eat(TokenKind::LParen) {
            let args = self.parse_call_arguments()?;
            self.expect(TokenKind::RParen)?;
            args
        } else {
            (Vec::new(), Vec::new())
        };
        let body = self.parse_block()?;
        let def = ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
        };
        Ok(self.alloc_stmt(StmtKind::ClassDef(Box::new(def)), self.span_from(start)))
    }
}
