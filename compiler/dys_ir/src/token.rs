//! Tokens produced by the lexer.
//!
//! Layout tokens (`Newline`, `Indent`, `Dedent`) are synthesized by the
//! lexer's layout pass; everything else maps one-to-one onto source text.

use std::fmt;

use bitflags::bitflags;

use crate::{Name, Span};

bitflags! {
    /// String literal prefix letters.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct StrPrefix: u8 {
        /// `r` / `R`: backslashes are literal.
        const RAW = 1 << 0;
        /// `b` / `B`: bytes literal.
        const BYTES = 1 << 1;
        /// `f` / `F`: formatted string literal.
        const FORMAT = 1 << 2;
    }
}

impl StrPrefix {
    /// Parse the prefix letters in front of a quote.
    pub fn from_letters(letters: &str) -> Self {
        let mut prefix = StrPrefix::empty();
        for c in letters.chars() {
            match c {
                'r' | 'R' => prefix |= StrPrefix::RAW,
                'b' | 'B' => prefix |= StrPrefix::BYTES,
                'f' | 'F' => prefix |= StrPrefix::FORMAT,
                _ => {}
            }
        }
        prefix
    }
}

/// A string literal token: prefix flags plus the span of the text between
/// the quotes (escapes not yet processed).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StrToken {
    pub prefix: StrPrefix,
    pub body: Span,
}

/// Token kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Literals and identifiers
    Ident(Name),
    Int(i64),
    /// Float stored as bits so the kind stays `Eq + Hash`.
    Float(u64),
    Str(StrToken),

    // Keywords
    False,
    None,
    True,
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Semi,
    Dot,
    Ellipsis,
    Arrow,
    Assign,
    Walrus,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    At,
    Tilde,
    Amp,
    Pipe,
    Caret,
    LShift,
    RShift,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Augmented assignment
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    DoubleSlashEq,
    PercentEq,
    DoubleStarEq,
    AtEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LShiftEq,
    RShiftEq,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int(_) => "integer literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::False => "'False'",
            TokenKind::None => "'None'",
            TokenKind::True => "'True'",
            TokenKind::And => "'and'",
            TokenKind::As => "'as'",
            TokenKind::Assert => "'assert'",
            TokenKind::Async => "'async'",
            TokenKind::Await => "'await'",
            TokenKind::Break => "'break'",
            TokenKind::Class => "'class'",
            TokenKind::Continue => "'continue'",
            TokenKind::Def => "'def'",
            TokenKind::Del => "'del'",
            TokenKind::Elif => "'elif'",
            TokenKind::Else => "'else'",
            TokenKind::Except => "'except'",
            TokenKind::Finally => "'finally'",
            TokenKind::For => "'for'",
            TokenKind::From => "'from'",
            TokenKind::Global => "'global'",
            TokenKind::If => "'if'",
            TokenKind::Import => "'import'",
            TokenKind::In => "'in'",
            TokenKind::Is => "'is'",
            TokenKind::Lambda => "'lambda'",
            TokenKind::Nonlocal => "'nonlocal'",
            TokenKind::Not => "'not'",
            TokenKind::Or => "'or'",
            TokenKind::Pass => "'pass'",
            TokenKind::Raise => "'raise'",
            TokenKind::Return => "'return'",
            TokenKind::Try => "'try'",
            TokenKind::While => "'while'",
            TokenKind::With => "'with'",
            TokenKind::Yield => "'yield'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Arrow => "'->'",
            TokenKind::Assign => "'='",
            TokenKind::Walrus => "':='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::DoubleSlash => "'//'",
            TokenKind::Percent => "'%'",
            TokenKind::At => "'@'",
            TokenKind::Tilde => "'~'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::LShift => "'<<'",
            TokenKind::RShift => "'>>'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::DoubleSlashEq => "'//='",
            TokenKind::PercentEq => "'%='",
            TokenKind::DoubleStarEq => "'**='",
            TokenKind::AtEq => "'@='",
            TokenKind::AmpEq => "'&='",
            TokenKind::PipeEq => "'|='",
            TokenKind::CaretEq => "'^='",
            TokenKind::LShiftEq => "'<<='",
            TokenKind::RShiftEq => "'>>='",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A token with its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Lexer output: a token stream that always ends with `Eof`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Last token, if any.
    #[inline]
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Token kinds only, in order.
    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
