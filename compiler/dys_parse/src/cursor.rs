//! Token cursor: position, lookahead and consumption over a `TokenList`.

use dys_ir::{Span, Token, TokenKind, TokenList};

use crate::ParseError;

/// Cursor over a token stream that always ends with `Eof`.
pub struct Cursor {
    tokens: TokenList,
    pos: usize,
    /// End of the last consumed token that carries source text.
    last_end: u32,
}

impl Cursor {
    pub fn new(tokens: TokenList) -> Self {
        Cursor {
            tokens,
            pos: 0,
            last_end: 0,
        }
    }

    #[inline]
    pub fn current(&self) -> Token {
        self.peek_token(0)
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Token `n` positions ahead; `Eof` past the end.
    pub fn peek_token(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        match self.tokens.get(idx) {
            Some(token) => *token,
            None => Token::new(TokenKind::Eof, Span::new(self.last_end, self.last_end)),
        }
    }

    #[inline]
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.peek_token(n).kind
    }

    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// End offset of the last real token consumed, for node spans.
    #[inline]
    pub fn last_end(&self) -> u32 {
        self.last_end
    }

    /// Consume the current token and return it.
    pub fn advance(&mut self) -> Token {
        let token = self.current();
        if !matches!(
            token.kind,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof
        ) {
            self.last_end = token.span.end;
        }
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it is `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or fail with "expected ...".
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                kind.describe(),
                self.current_kind(),
                self.current_span(),
            ))
        }
    }
}

#[cfg(test)]
mod tests;
