//! Parse error type.

use std::fmt;

use dys_ir::{Span, TokenKind};
use dys_lexer::LexError;

/// A syntax error with the span it points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    #[cold]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            span,
            message: message.into(),
        }
    }

    #[cold]
    pub fn expected(what: &str, found: TokenKind, span: Span) -> Self {
        ParseError::new(format!("expected {what}, found {}", found.describe()), span)
    }

    #[cold]
    pub fn invalid_syntax(span: Span) -> Self {
        ParseError::new("invalid syntax", span)
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(err.kind.to_string(), err.span)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}
