//! Atoms, displays, comprehensions and trailers (calls, subscripts,
//! attributes).

use dys_ir::{Comprehension, Constant, DictEntry, ExprId, ExprKind, Keyword, Span, TokenKind};
use rustc_hash::FxHashSet;

use crate::grammar::target::TargetContext;
use crate::{ParseError, Parser};

impl Parser<'_> {
    /// `atom trailer*`
    pub(crate) fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            let start = self.expr_span(expr);
            match self.current_kind() {
                TokenKind::LParen => {
                    self.cursor.advance();
                    let (args, keywords) = self.parse_call_arguments()?;
                    self.expect(TokenKind::RParen)?;
                    expr = self.alloc_expr(
                        ExprKind::Call {
                            func: expr,
                            args,
                            keywords,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let slice = self.parse_subscript_list()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = self.alloc_expr(
                        ExprKind::Subscript { value: expr, slice },
                        self.span_from(start),
                    );
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let (attr, _) = self.parse_name()?;
                    expr = self.alloc_expr(
                        ExprKind::Attribute { value: expr, attr },
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<ExprId, ParseError> {
        let token = self.cursor.current();
        let constant = match token.kind {
            TokenKind::Ident(name) => {
                self.cursor.advance();
                return Ok(self.alloc_expr(ExprKind::Name(name), token.span));
            }
            TokenKind::Str(_) => return self.parse_strings(),
            TokenKind::LParen => return self.nested(Self::parse_paren),
            TokenKind::LBracket => return self.nested(Self::parse_list_display),
            TokenKind::LBrace => return self.nested(Self::parse_brace_display),
            TokenKind::Int(value) => Constant::Int(value),
            TokenKind::Float(bits) => Constant::Float(f64::from_bits(bits)),
            TokenKind::None => Constant::None,
            TokenKind::True => Constant::Bool(true),
            TokenKind::False => Constant::Bool(false),
            TokenKind::Ellipsis => Constant::Ellipsis,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Indent | TokenKind::Dedent => {
                return Err(ParseError::invalid_syntax(token.span));
            }
            found => return Err(ParseError::expected("an expression", found, token.span)),
        };
        self.cursor.advance();
        Ok(self.alloc_expr(ExprKind::Constant(constant), token.span))
    }

    /// Element of a display: `*expr` or a named expression.
    fn parse_display_element(&mut self) -> Result<ExprId, ParseError> {
        if self.check(TokenKind::Star) {
            self.parse_starred()
        } else {
            self.parse_named_expr()
        }
    }

    fn at_comprehension(&self) -> bool {
        self.check(TokenKind::For)
            || (self.check(TokenKind::Async) && self.cursor.peek_kind(1) == TokenKind::For)
    }

    /// Elements after the first, up to `close`.
    fn parse_display_rest(
        &mut self,
        first: ExprId,
        close: TokenKind,
    ) -> Result<Vec<ExprId>, ParseError> {
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(close) {
                break;
            }
            elts.push(self.parse_display_element()?);
        }
        Ok(elts)
    }

    fn reject_starred_comprehension(&self, elt: ExprId) -> Result<(), ParseError> {
        if let ExprKind::Starred(_) = self.arena.expr(elt).kind {
            return Err(ParseError::new(
                "iterable unpacking cannot be used in comprehension",
                self.expr_span(elt),
            ));
        }
        Ok(())
    }

    /// `'(' ')' | '(' yield ')' | '(' genexp ')' | '(' tuple ')' | '(' expr ')'`
    fn parse_paren(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LParen)?;
        if self.eat(TokenKind::RParen) {
            return Ok(self.alloc_expr(ExprKind::Tuple(Vec::new()), self.span_from(start)));
        }
        if self.check(TokenKind::Yield) {
            let value = self.parse_yield()?;
            self.expect(TokenKind::RParen)?;
            return Ok(value);
        }

        let first = self.parse_display_element()?;
        if self.at_comprehension() {
            self.reject_starred_comprehension(first)?;
            let generators = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RParen)?;
            return Ok(self.alloc_expr(
                ExprKind::GeneratorExp {
                    elt: first,
                    generators,
                },
                self.span_from(start),
            ));
        }
        if self.check(TokenKind::Comma) {
            let elts = self.parse_display_rest(first, TokenKind::RParen)?;
            self.expect(TokenKind::RParen)?;
            return Ok(self.alloc_expr(ExprKind::Tuple(elts), self.span_from(start)));
        }
        self.expect(TokenKind::RParen)?;
        if let ExprKind::Starred(_) = self.arena.expr(first).kind {
            return Err(ParseError::new(
                "can't use starred expression here",
                self.expr_span(first),
            ));
        }
        Ok(first)
    }

    fn parse_list_display(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LBracket)?;
        if self.eat(TokenKind::RBracket) {
            return Ok(self.alloc_expr(ExprKind::List(Vec::new()), self.span_from(start)));
        }
        let first = self.parse_display_element()?;
        if self.at_comprehension() {
            self.reject_starred_comprehension(first)?;
            let generators = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RBracket)?;
            return Ok(self.alloc_expr(
                ExprKind::ListComp {
                    elt: first,
                    generators,
                },
                self.span_from(start),
            ));
        }
        let elts = self.parse_display_rest(first, TokenKind::RBracket)?;
        self.expect(TokenKind::RBracket)?;
        Ok(self.alloc_expr(ExprKind::List(elts), self.span_from(start)))
    }

    /// Dict or set display / comprehension.
    fn parse_brace_display(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LBrace)?;
        if self.eat(TokenKind::RBrace) {
            return Ok(self.alloc_expr(ExprKind::Dict(Vec::new()), self.span_from(start)));
        }
        if self.check(TokenKind::DoubleStar) {
            return self.finish_dict(start, Vec::new());
        }

        // A leading `key:` decides between dict and set.
        let first = self.parse_display_element()?;
        if !self.check(TokenKind::Colon) {
            return self.finish_set(start, first);
        }
        if let ExprKind::Starred(_) = self.arena.expr(first).kind {
            return Err(ParseError::invalid_syntax(self.current_span()));
        }
        self.cursor.advance();
        let value = self.parse_test()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RBrace)?;
            return Ok(self.alloc_expr(
                ExprKind::DictComp {
                    key: first,
                    value,
                    generators,
                },
                self.span_from(start),
            ));
        }
        let entry = DictEntry {
            key: Some(first),
            value,
        };
        self.finish_dict(start, vec![entry])
    }

    fn parse_dict_entry(&mut self) -> Result<DictEntry, ParseError> {
        if self.eat(TokenKind::DoubleStar) {
            let value = self.parse_bitor()?;
            return Ok(DictEntry { key: None, value });
        }
        let key = self.parse_test()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_test()?;
        Ok(DictEntry {
            key: Some(key),
            value,
        })
    }

    fn finish_dict(
        &mut self,
        start: Span,
        mut entries: Vec<DictEntry>,
    ) -> Result<ExprId, ParseError> {
        if entries.is_empty() {
            entries.push(self.parse_dict_entry()?);
        }
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RBrace) {
                break;
            }
            entries.push(self.parse_dict_entry()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.alloc_expr(ExprKind::Dict(entries), self.span_from(start)))
    }

    fn finish_set(&mut self, start: Span, first: ExprId) -> Result<ExprId, ParseError> {
        if self.at_comprehension() {
            self.reject_starred_comprehension(first)?;
            let generators = self.parse_comprehension_clauses()?;
            self.expect(TokenKind::RBrace)?;
            return Ok(self.alloc_expr(
                ExprKind::SetComp {
                    elt: first,
                    generators,
                },
                self.span_from(start),
            ));
        }
        let elts = self.parse_display_rest(first, TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace)?;
        Ok(self.alloc_expr(ExprKind::Set(elts), self.span_from(start)))
    }

    /// `(['async'] 'for' targets 'in' or_test ('if' test_no_cond)*)+`
    pub(crate) fn parse_comprehension_clauses(&mut self) -> Result<Vec<Comprehension>, ParseError> {
        let mut generators = Vec::new();
        while self.at_comprehension() {
            let is_async = self.eat(TokenKind::Async);
            self.expect(TokenKind::For)?;
            let target = self.parse_target_list()?;
            self.check_target(target, TargetContext::Assign)?;
            self.expect(TokenKind::In)?;
            let iter = self.parse_or_test()?;
            let mut ifs = Vec::new();
            while self.eat(TokenKind::If) {
                ifs.push(self.parse_test_no_cond()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }
        Ok(generators)
    }

    /// Arguments between the parentheses of a call or class header.
    pub(crate) fn parse_call_arguments(
        &mut self,
    ) -> Result<(Vec<ExprId>, Vec<Keyword>), ParseError> {
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();
        let mut keyword_names = FxHashSet::default();
        let mut seen_kwargs_splat = false;

        while !self.check(TokenKind::RParen) {
            let start = self.current_span();
            match (self.current_kind(), self.cursor.peek_kind(1)) {
                (TokenKind::Star, _) => {
                    if seen_kwargs_splat {
                        return Err(ParseError::new(
                            "iterable argument unpacking follows keyword argument unpacking",
                            start,
                        ));
                    }
                    args.push(self.parse_starred_argument()?);
                }
                (TokenKind::DoubleStar, _) => {
                    self.cursor.advance();
                    let value = self.parse_test()?;
                    seen_kwargs_splat = true;
                    keywords.push(Keyword {
                        arg: None,
                        value,
                        span: self.span_from(start),
                    });
                }
                (TokenKind::Ident(name), TokenKind::Assign) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    if !keyword_names.insert(name) {
                        return Err(ParseError::new("keyword argument repeated", start));
                    }
                    let value = self.parse_test()?;
                    keywords.push(Keyword {
                        arg: Some(name),
                        value,
                        span: self.span_from(start),
                    });
                }
                _ => {
                    let value = self.parse_named_expr()?;
                    if self.check(TokenKind::Assign) {
                        return Err(ParseError::new(
                            "expression cannot contain assignment, perhaps you meant \"==\"?",
                            self.expr_span(value),
                        ));
                    }
                    if self.at_comprehension() {
                        let generators = self.parse_comprehension_clauses()?;
                        let span = self.span_from(start);
                        let genexp = self.alloc_expr(
                            ExprKind::GeneratorExp {
                                elt: value,
                                generators,
                            },
                            span,
                        );
                        if !args.is_empty() || !keywords.is_empty() || self.check(TokenKind::Comma)
                        {
                            return Err(ParseError::new(
                                "Generator expression must be parenthesized",
                                span,
                            ));
                        }
                        args.push(genexp);
                        break;
                    }
                    if seen_kwargs_splat {
                        return Err(ParseError::new(
                            "positional argument follows keyword argument unpacking",
                            self.expr_span(value),
                        ));
                    }
                    if !keywords.is_empty() {
                        return Err(ParseError::new(
                            "positional argument follows keyword argument",
                            self.expr_span(value),
                        ));
                    }
                    args.push(value);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok((args, keywords))
    }

    fn parse_starred_argument(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::Star)?;
        let value = self.parse_test()?;
        Ok(self.alloc_expr(ExprKind::Starred(value), self.span_from(start)))
    }

    /// `slice (',' slice)* [',']`, a tuple when a comma appears.
    fn parse_subscript_list(&mut self) -> Result<ExprId, ParseError> {
        let first = self.parse_slice_item()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let start = self.expr_span(first);
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RBracket) {
                break;
            }
            elts.push(self.parse_slice_item()?);
        }
        Ok(self.alloc_expr(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn slice_bound_follows(&self) -> bool {
        !matches!(
            self.current_kind(),
            TokenKind::Colon | TokenKind::Comma | TokenKind::RBracket
        )
    }

    /// `[test] ':' [test] [':' [test]] | named_expr`
    fn parse_slice_item(&mut self) -> Result<ExprId, ParseError> {
        let start = self.current_span();
        let lower = if self.check(TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_named_expr()?;
            if !self.check(TokenKind::Colon) {
                return Ok(expr);
            }
            Some(expr)
        };
        self.expect(TokenKind::Colon)?;
        let upper = if self.slice_bound_follows() {
            Some(self.parse_test()?)
        } else {
            None
        };
        let step = if self.eat(TokenKind::Colon) && self.slice_bound_follows() {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(self.alloc_expr(ExprKind::Slice { lower, upper, step }, self.span_from(start)))
    }
}
