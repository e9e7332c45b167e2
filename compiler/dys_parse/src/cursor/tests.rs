#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use super::*;
use dys_ir::StringInterner;
use pretty_assertions::assert_eq;

fn cursor(source: &str) -> Cursor {
    let interner = StringInterner::new();
    Cursor::new(dys_lexer::lex(source, &interner).unwrap())
}

#[test]
fn advance_stops_at_eof() {
    let mut c = cursor("x");
    c.advance();
    c.advance();
    assert!(c.is_at_end());
    c.advance();
    assert!(c.is_at_end());
}

#[test]
fn last_end_ignores_layout_tokens() {
    let mut c = cursor("ab\n");
    c.advance();
    assert_eq!(c.last_end(), 2);
    assert_eq!(c.current_kind(), TokenKind::Newline);
    c.advance();
    assert_eq!(c.last_end(), 2);
}

#[test]
fn expect_reports_what_was_found() {
    let mut c = cursor("1");
    let err = c.expect(TokenKind::LParen).unwrap_err();
    assert_eq!(err.message, "expected '(', found integer literal");
}

#[test]
fn peek_past_end_is_eof() {
    let c = cursor("x");
    assert_eq!(c.peek_kind(10), TokenKind::Eof);
}
