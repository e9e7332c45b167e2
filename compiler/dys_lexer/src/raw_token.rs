//! Raw Token Definition
//!
//! The `RawToken` enum is the logos-derived tokenizer output before
//! interning, literal conversion and the indentation layout pass.

use logos::{Lexer, Logos};

/// Scan forward for the closing triple quote of a long string literal.
///
/// Backslashes escape the next byte, so `\'''` does not terminate.
fn close_triple(lex: &mut Lexer<'_, RawToken>, quote: u8) -> bool {
    let rest = lex.remainder().as_bytes();
    let closing = [quote, quote, quote];
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == b'\\' {
            i += 2;
            continue;
        }
        if rest[i..].starts_with(&closing) {
            lex.bump(i + 3);
            return true;
        }
        i += 1;
    }
    false
}

/// Scan forward for the closing quote of a one-line string literal.
///
/// A bare newline ends the line first and the literal is unterminated;
/// an escaped one continues it.
fn close_short(lex: &mut Lexer<'_, RawToken>, quote: u8) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' if rest[i + 1..].starts_with(b"\r\n") => i += 3,
            b'\\' => i += 2,
            b'\n' => return false,
            byte if byte == quote => {
                lex.bump(i + 1);
                return true;
            }
            _ => i += 1,
        }
    }
    false
}

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\x0C]+")] // Skip horizontal whitespace
pub(crate) enum RawToken {
    #[regex(r"#[^\n]*")]
    Comment,

    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"\\\r?\n")]
    LineContinuation,

    // Keywords
    #[token("False")]
    False,
    #[token("None")]
    None,
    #[token("True")]
    True,
    #[token("and")]
    And,
    #[token("as")]
    As,
    #[token("assert")]
    Assert,
    #[token("async")]
    Async,
    #[token("await")]
    Await,
    #[token("break")]
    Break,
    #[token("class")]
    Class,
    #[token("continue")]
    Continue,
    #[token("def")]
    Def,
    #[token("del")]
    Del,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("except")]
    Except,
    #[token("finally")]
    Finally,
    #[token("for")]
    For,
    #[token("from")]
    From,
    #[token("global")]
    Global,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("is")]
    Is,
    #[token("lambda")]
    Lambda,
    #[token("nonlocal")]
    Nonlocal,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("pass")]
    Pass,
    #[token("raise")]
    Raise,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("while")]
    While,
    #[token("with")]
    With,
    #[token("yield")]
    Yield,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Numbers
    #[regex(r"[0-9][0-9_]*")]
    DecInt,
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    HexInt,
    #[regex(r"0[oO][0-7_]+")]
    OctInt,
    #[regex(r"0[bB][01_]+")]
    BinInt,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    Float,
    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?|\.[0-9][0-9_]*)([eE][+-]?[0-9_]+)?[jJ]")]
    Imaginary,

    // Strings: prefix letters and the opening quote; callbacks scan the body
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?'"#, |lex| close_short(lex, b'\''))]
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?""#, |lex| close_short(lex, b'"'))]
    ShortString,
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?'''"#, |lex| close_triple(lex, b'\''))]
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?""""#, |lex| close_triple(lex, b'"'))]
    LongString,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("=")]
    Assign,
    #[token(":=")]
    Walrus,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("@")]
    At,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // Augmented assignment
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("//=")]
    DoubleSlashEq,
    #[token("%=")]
    PercentEq,
    #[token("**=")]
    DoubleStarEq,
    #[token("@=")]
    AtEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    LShiftEq,
    #[token(">>=")]
    RShiftEq,
}
