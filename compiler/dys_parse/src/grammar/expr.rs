//! Expression precedence ladder.
//!
//! From loosest to tightest: lambda, conditional, `or`, `and`, `not`,
//! comparisons, `|`, `^`, `&`, shifts, `+ -`, `* / // % @`, unary
//! `+ - ~`, `**`, `await`, primaries.

use dys_ir::{BinaryOp, BoolOp, CmpOp, ExprId, ExprKind, Span, TokenKind, UnaryOp};

use crate::{ParseError, Parser};

type Rule<'a> = fn(&mut Parser<'a>) -> Result<ExprId, ParseError>;

fn shift_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::LShift => Some(BinaryOp::LShift),
        TokenKind::RShift => Some(BinaryOp::RShift),
        _ => None,
    }
}

fn arith_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn term_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mult),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::DoubleSlash => Some(BinaryOp::FloorDiv),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::At => Some(BinaryOp::MatMult),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// `(star_expr | test) (',' ...)* [',']`, a tuple when a comma appears.
    pub(crate) fn parse_star_expressions(&mut self) -> Result<ExprId, ParseError> {
        let first = self.parse_star_or_test()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let start = self.expr_span(first);
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elts.push(self.parse_star_or_test()?);
        }
        Ok(self.alloc_expr(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_star_or_test(&mut self) -> Result<ExprId, ParseError> {
        if self.check(TokenKind::Star) {
            self.parse_starred()
        } else {
            self.parse_test()
        }
    }

    /// `'*' expr`
    pub(crate) fn parse_starred(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::Star)?;
        let value = self.parse_bitor()?;
        Ok(self.alloc_expr(ExprKind::Starred(value), self.span_from(start)))
    }

    /// Target list of `for` loops and comprehensions: `expr (',' expr)*`.
    pub(crate) fn parse_target_list(&mut self) -> Result<ExprId, ParseError> {
        let first = self.parse_star_or_bitor()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let start = self.expr_span(first);
        let mut elts = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::In) || !self.starts_expression() {
                break;
            }
            elts.push(self.parse_star_or_bitor()?);
        }
        Ok(self.alloc_expr(ExprKind::Tuple(elts), self.span_from(start)))
    }

    fn parse_star_or_bitor(&mut self) -> Result<ExprId, ParseError> {
        if self.check(TokenKind::Star) {
            self.parse_starred()
        } else {
            self.parse_bitor()
        }
    }

    /// Whether the current token can begin an expression.
    pub(crate) fn starts_expression(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::None
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Ellipsis
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Not
                | TokenKind::Lambda
                | TokenKind::Await
                | TokenKind::Star
        )
    }

    /// `NAME ':=' test | test`
    pub(crate) fn parse_named_expr(&mut self) -> Result<ExprId, ParseError> {
        if let (TokenKind::Ident(target), TokenKind::Walrus) =
            (self.current_kind(), self.cursor.peek_kind(1))
        {
            let start = self.cursor.advance().span;
            self.cursor.advance();
            let value = self.parse_test()?;
            return Ok(self.alloc_expr(ExprKind::NamedExpr { target, value }, self.span_from(start)));
        }
        let expr = self.parse_test()?;
        if self.check(TokenKind::Walrus) {
            return Err(ParseError::new(
                "cannot use assignment expressions with this target",
                self.expr_span(expr),
            ));
        }
        Ok(expr)
    }

    /// `lambda | or_test ['if' or_test 'else' test]`
    pub(crate) fn parse_test(&mut self) -> Result<ExprId, ParseError> {
        self.nested(|p| {
            if p.check(TokenKind::Lambda) {
                return p.parse_lambda();
            }
            let body = p.parse_or_test()?;
            if !p.eat(TokenKind::If) {
                return Ok(body);
            }
            let test = p.parse_or_test()?;
            p.expect(TokenKind::Else)?;
            let orelse = p.parse_test()?;
            let span = p.span_from(p.expr_span(body));
            Ok(p.alloc_expr(ExprKind::IfExp { test, body, orelse }, span))
        })
    }

    /// Conditional-free expression, used after `lambda` in comprehension filters.
    pub(crate) fn parse_test_no_cond(&mut self) -> Result<ExprId, ParseError> {
        if self.check(TokenKind::Lambda) {
            return self.parse_lambda();
        }
        self.parse_or_test()
    }

    fn parse_lambda(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::Lambda)?;
        let params = self.parse_parameters(TokenKind::Colon, false)?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_test()?;
        Ok(self.alloc_expr(
            ExprKind::Lambda {
                params: Box::new(params),
                body,
            },
            self.span_from(start),
        ))
    }

    pub(crate) fn parse_or_test(&mut self) -> Result<ExprId, ParseError> {
        self.parse_bool_chain(TokenKind::Or, BoolOp::Or, Self::parse_and_test)
    }

    fn parse_and_test(&mut self) -> Result<ExprId, ParseError> {
        self.parse_bool_chain(TokenKind::And, BoolOp::And, Self::parse_not_test)
    }

    fn parse_bool_chain(
        &mut self,
        token: TokenKind,
        op: BoolOp,
        next: Rule<'a>,
    ) -> Result<ExprId, ParseError> {
        let first = next(self)?;
        if !self.check(token) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(token) {
            values.push(next(self)?);
        }
        let span = self.span_from(self.expr_span(first));
        Ok(self.alloc_expr(ExprKind::BoolOp { op, values }, span))
    }

    fn parse_not_test(&mut self) -> Result<ExprId, ParseError> {
        if !self.check(TokenKind::Not) {
            return self.parse_comparison();
        }
        let start = self.cursor.advance().span;
        let operand = self.nested(Self::parse_not_test)?;
        Ok(self.alloc_expr(
            ExprKind::UnaryOp {
                op: UnaryOp::Not,
                operand,
            },
            self.span_from(start),
        ))
    }

    fn match_comparison(&mut self) -> Option<CmpOp> {
        let op = match self.current_kind() {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::LtEq => CmpOp::LtE,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::GtEq => CmpOp::GtE,
            TokenKind::In => CmpOp::In,
            TokenKind::Is => {
                if self.cursor.peek_kind(1) == TokenKind::Not {
                    self.cursor.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            TokenKind::Not if self.cursor.peek_kind(1) == TokenKind::In => {
                self.cursor.advance();
                CmpOp::NotIn
            }
            _ => return None,
        };
        self.cursor.advance();
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<ExprId, ParseError> {
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.match_comparison() {
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        let span = self.span_from(self.expr_span(left));
        Ok(self.alloc_expr(
            ExprKind::Compare {
                left,
                ops,
                comparators,
            },
            span,
        ))
    }

    fn parse_binary_level(
        &mut self,
        next: Rule<'a>,
        matcher: fn(TokenKind) -> Option<BinaryOp>,
    ) -> Result<ExprId, ParseError> {
        let mut left = next(self)?;
        while let Some(op) = matcher(self.current_kind()) {
            self.cursor.advance();
            let right = next(self)?;
            let span = self.span_from(self.expr_span(left));
            left = self.alloc_expr(ExprKind::BinOp { left, op, right }, span);
        }
        Ok(left)
    }

    pub(crate) fn parse_bitor(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_bitxor, |k| {
            (k == TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bitxor(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_bitand, |k| {
            (k == TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn parse_bitand(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_shift, |k| {
            (k == TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_shift(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_arith, shift_op)
    }

    fn parse_arith(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_term, arith_op)
    }

    fn parse_term(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(Self::parse_factor, term_op)
    }

    /// Unary `+ - ~`, then `power`.
    fn parse_factor(&mut self) -> Result<ExprId, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::USub,
            TokenKind::Plus => UnaryOp::UAdd,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let start = self.cursor.advance().span;
        let operand = self.nested(Self::parse_factor)?;
        Ok(self.alloc_expr(ExprKind::UnaryOp { op, operand }, self.span_from(start)))
    }

    /// `await_primary ['**' factor]`
    fn parse_power(&mut self) -> Result<ExprId, ParseError> {
        let base = self.parse_await_primary()?;
        if !self.eat(TokenKind::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_factor)?;
        let span = self.span_from(self.expr_span(base));
        Ok(self.alloc_expr(
            ExprKind::BinOp {
                left: base,
                op: BinaryOp::Pow,
                right: exponent,
            },
            span,
        ))
    }

    fn parse_await_primary(&mut self) -> Result<ExprId, ParseError> {
        if !self.check(TokenKind::Await) {
            return self.parse_primary();
        }
        let start = self.cursor.advance().span;
        let value = self.parse_primary()?;
        Ok(self.alloc_expr(ExprKind::Await(value), self.span_from(start)))
    }

    /// `'yield' ['from' test | star_expressions]`
    pub(crate) fn parse_yield(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::Yield)?;
        if self.eat(TokenKind::From) {
            let value = self.parse_test()?;
            return Ok(self.alloc_expr(ExprKind::YieldFrom(value), self.span_from(start)));
        }
        let value = if self.starts_expression() {
            Some(self.parse_star_expressions()?)
        } else {
            None
        };
        Ok(self.alloc_expr(ExprKind::Yield(value), self.span_from(start)))
    }

    /// Identifier token, returning its name and span.
    pub(crate) fn parse_name(&mut self) -> Result<(dys_ir::Name, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let span = self.cursor.advance().span;
                Ok((name, span))
            }
            found => Err(ParseError::expected("identifier", found, self.current_span())),
        }
    }
}
