//! Lexer error types.

use std::fmt;

use dys_ir::Span;

/// A lexer error: where it happened and what went wrong.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

/// What kind of lexer error occurred.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LexErrorKind {
    /// Missing closing quote.
    UnterminatedString,
    /// Character that starts no token.
    InvalidCharacter(char),
    /// Integer literal does not fit in 64 bits.
    IntOverflow,
    /// Float literal could not be parsed.
    InvalidFloat,
    /// `1j` and friends.
    ComplexLiteral,
    /// A dedent that lands between two enclosing indentation levels.
    InconsistentDedent,
    /// A closing bracket with no matching opener.
    UnmatchedBracket(char),
    /// Malformed escape sequence inside a string literal.
    InvalidEscape(String),
    /// Non-ASCII character inside a bytes literal.
    NonAsciiBytes,
}

impl LexError {
    #[cold]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError { span, kind }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            LexErrorKind::InvalidCharacter(c) => write!(f, "invalid character '{c}'"),
            LexErrorKind::IntOverflow => f.write_str("integer literal is too large"),
            LexErrorKind::InvalidFloat => f.write_str("invalid float literal"),
            LexErrorKind::ComplexLiteral => f.write_str("complex literals are not supported"),
            LexErrorKind::InconsistentDedent => {
                f.write_str("unindent does not match any outer indentation level")
            }
            LexErrorKind::UnmatchedBracket(c) => write!(f, "unmatched '{c}'"),
            LexErrorKind::InvalidEscape(detail) => write!(f, "invalid escape sequence: {detail}"),
            LexErrorKind::NonAsciiBytes => {
                f.write_str("bytes can only contain ASCII literal characters")
            }
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for LexError {}
