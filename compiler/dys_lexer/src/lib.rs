//! Lexer for the Dys language.
//!
//! Two stages:
//! 1. logos produces `RawToken`s (keywords, literals, punctuation, newlines).
//! 2. A layout pass converts raw tokens into `TokenKind`s, interns
//!    identifiers, parses numeric literals, drops comments and joined lines,
//!    and synthesizes `Newline`/`Indent`/`Dedent` from leading whitespace.
//!
//! Newlines inside brackets and after a backslash continuation are not
//! logical line ends. String bodies are left raw; see [`cook`].

mod cook;
mod lex_error;
mod raw_token;

pub use cook::{cook_bytes, cook_str};
pub use lex_error::{LexError, LexErrorKind};

use dys_ir::{Span, StrPrefix, StrToken, StringInterner, Token, TokenKind, TokenList};
use logos::Logos;
use raw_token::RawToken;

/// Lex a whole program.
pub fn lex(source: &str, interner: &StringInterner) -> Result<TokenList, LexError> {
    Layout::new(source, 0, interner, false).run()
}

/// Lex a fragment that holds a single expression (an f-string field).
///
/// Spans are shifted by `base` so they point into the enclosing program.
/// The fragment behaves as if wrapped in brackets: newlines are ignored and
/// no layout tokens are produced besides the final `Eof`.
pub fn lex_fragment(
    source: &str,
    base: u32,
    interner: &StringInterner,
) -> Result<TokenList, LexError> {
    Layout::new(source, base, interner, true).run()
}

/// Indentation width of a line prefix; tabs advance to the next multiple of 8.
fn indent_width(prefix: &str) -> u32 {
    let mut width = 0u32;
    for c in prefix.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            '\x0C' => width = 0,
            _ => break,
        }
    }
    width
}

struct Layout<'src, 'i> {
    source: &'src str,
    base: u32,
    interner: &'i StringInterner,
    fragment: bool,
    out: TokenList,
    indents: Vec<u32>,
    brackets: Vec<char>,
    line_start: usize,
    at_line_start: bool,
}

impl<'src, 'i> Layout<'src, 'i> {
    fn new(source: &'src str, base: u32, interner: &'i StringInterner, fragment: bool) -> Self {
        Layout {
            source,
            base,
            interner,
            fragment,
            out: TokenList::new(),
            indents: vec![0],
            brackets: Vec::new(),
            line_start: 0,
            at_line_start: true,
        }
    }

    fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::from_range(range).offset_by(self.base)
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.out.push(Token::new(kind, span));
    }

    fn run(mut self) -> Result<TokenList, LexError> {
        let mut raw = RawToken::lexer(self.source);
        while let Some(result) = raw.next() {
            let range = raw.span();
            let span = self.span(range.clone());
            let token = match result {
                Ok(token) => token,
                Err(()) => return Err(self.invalid(range)),
            };

            match token {
                RawToken::Comment | RawToken::LineContinuation => continue,
                RawToken::Newline => {
                    if self.fragment || !self.brackets.is_empty() {
                        continue;
                    }
                    if !self.at_line_start {
                        self.push(TokenKind::Newline, span);
                        self.at_line_start = true;
                    }
                    self.line_start = range.end;
                    continue;
                }
                _ => {}
            }

            if self.at_line_start && !self.fragment {
                self.indent_to(range.start, span)?;
                self.at_line_start = false;
            }

            let text = &self.source[range.clone()];
            let kind = self.convert(token, text, range, span)?;
            self.push(kind, span);
        }

        let end = self.span(self.source.len()..self.source.len());
        if let Some(&open) = self.brackets.last() {
            return Err(LexError::new(LexErrorKind::UnmatchedBracket(open), end));
        }
        if !self.fragment {
            if !self.at_line_start {
                self.push(TokenKind::Newline, end);
            }
            while self.indents.len() > 1 {
                self.indents.pop();
                self.push(TokenKind::Dedent, end);
            }
        }
        self.push(TokenKind::Eof, end);
        Ok(self.out)
    }

    /// Emit `Indent`/`Dedent` for the first token of a logical line.
    fn indent_to(&mut self, token_start: usize, span: Span) -> Result<(), LexError> {
        let width = indent_width(&self.source[self.line_start..token_start]);
        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent, span);
            return Ok(());
        }
        while width < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.push(TokenKind::Dedent, span);
        }
        if width != self.indents.last().copied().unwrap_or(0) {
            return Err(LexError::new(LexErrorKind::InconsistentDedent, span));
        }
        Ok(())
    }

    #[cold]
    fn invalid(&self, range: std::ops::Range<usize>) -> LexError {
        let span = self.span(range.clone());
        let c = self.source[range.start..].chars().next().unwrap_or(' ');
        let kind = if c == '\'' || c == '"' || self.source[range].contains(['\'', '"']) {
            LexErrorKind::UnterminatedString
        } else {
            LexErrorKind::InvalidCharacter(c)
        };
        LexError::new(kind, span)
    }

    fn convert(
        &mut self,
        token: RawToken,
        text: &str,
        range: std::ops::Range<usize>,
        span: Span,
    ) -> Result<TokenKind, LexError> {
        Ok(match token {
            RawToken::Comment | RawToken::Newline | RawToken::LineContinuation => {
                unreachable_layout(span)?
            }
            RawToken::False => TokenKind::False,
            RawToken::None => TokenKind::None,
            RawToken::True => TokenKind::True,
            RawToken::And => TokenKind::And,
            RawToken::As => TokenKind::As,
            RawToken::Assert => TokenKind::Assert,
            RawToken::Async => TokenKind::Async,
            RawToken::Await => TokenKind::Await,
            RawToken::Break => TokenKind::Break,
            RawToken::Class => TokenKind::Class,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Def => TokenKind::Def,
            RawToken::Del => TokenKind::Del,
            RawToken::Elif => TokenKind::Elif,
            RawToken::Else => TokenKind::Else,
            RawToken::Except => TokenKind::Except,
            RawToken::Finally => TokenKind::Finally,
            RawToken::For => TokenKind::For,
            RawToken::From => TokenKind::From,
            RawToken::Global => TokenKind::Global,
            RawToken::If => TokenKind::If,
            RawToken::Import => TokenKind::Import,
            RawToken::In => TokenKind::In,
            RawToken::Is => TokenKind::Is,
            RawToken::Lambda => TokenKind::Lambda,
            RawToken::Nonlocal => TokenKind::Nonlocal,
            RawToken::Not => TokenKind::Not,
            RawToken::Or => TokenKind::Or,
            RawToken::Pass => TokenKind::Pass,
            RawToken::Raise => TokenKind::Raise,
            RawToken::Return => TokenKind::Return,
            RawToken::Try => TokenKind::Try,
            RawToken::While => TokenKind::While,
            RawToken::With => TokenKind::With,
            RawToken::Yield => TokenKind::Yield,
            RawToken::Ident => TokenKind::Ident(self.interner.intern(text)),
            RawToken::DecInt => TokenKind::Int(parse_int(text, 10, span)?),
            RawToken::HexInt => TokenKind::Int(parse_int(&text[2..], 16, span)?),
            RawToken::OctInt => TokenKind::Int(parse_int(&text[2..], 8, span)?),
            RawToken::BinInt => TokenKind::Int(parse_int(&text[2..], 2, span)?),
            RawToken::Float => {
                let cleaned: String = text.chars().filter(|&c| c != '_').collect();
                let value: f64 = cleaned
                    .parse()
                    .map_err(|_| LexError::new(LexErrorKind::InvalidFloat, span))?;
                TokenKind::Float(value.to_bits())
            }
            RawToken::Imaginary => {
                return Err(LexError::new(LexErrorKind::ComplexLiteral, span));
            }
            RawToken::ShortString => TokenKind::Str(self.string_token(text, range, 1)),
            RawToken::LongString => TokenKind::Str(self.string_token(text, range, 3)),
            RawToken::LParen => self.open('(', TokenKind::LParen),
            RawToken::LBracket => self.open('[', TokenKind::LBracket),
            RawToken::LBrace => self.open('{', TokenKind::LBrace),
            RawToken::RParen => self.close(')', TokenKind::RParen, span)?,
            RawToken::RBracket => self.close(']', TokenKind::RBracket, span)?,
            RawToken::RBrace => self.close('}', TokenKind::RBrace, span)?,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Assign => TokenKind::Assign,
            RawToken::Walrus => TokenKind::Walrus,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::DoubleStar => TokenKind::DoubleStar,
            RawToken::Slash => TokenKind::Slash,
            RawToken::DoubleSlash => TokenKind::DoubleSlash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::At => TokenKind::At,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Caret => TokenKind::Caret,
            RawToken::LShift => TokenKind::LShift,
            RawToken::RShift => TokenKind::RShift,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::PlusEq => TokenKind::PlusEq,
            RawToken::MinusEq => TokenKind::MinusEq,
            RawToken::StarEq => TokenKind::StarEq,
            RawToken::SlashEq => TokenKind::SlashEq,
            RawToken::DoubleSlashEq => TokenKind::DoubleSlashEq,
            RawToken::PercentEq => TokenKind::PercentEq,
            RawToken::DoubleStarEq => TokenKind::DoubleStarEq,
            RawToken::AtEq => TokenKind::AtEq,
            RawToken::AmpEq => TokenKind::AmpEq,
            RawToken::PipeEq => TokenKind::PipeEq,
            RawToken::CaretEq => TokenKind::CaretEq,
            RawToken::LShiftEq => TokenKind::LShiftEq,
            RawToken::RShiftEq => TokenKind::RShiftEq,
        })
    }

    fn string_token(&self, text: &str, range: std::ops::Range<usize>, quote_len: usize) -> StrToken {
        let prefix_len = text.find(['\'', '"']).unwrap_or(0);
        let body = (range.start + prefix_len + quote_len)..(range.end - quote_len);
        StrToken {
            prefix: StrPrefix::from_letters(&text[..prefix_len]),
            body: self.span(body),
        }
    }

    fn open(&mut self, bracket: char, kind: TokenKind) -> TokenKind {
        self.brackets.push(bracket);
        kind
    }

    fn close(&mut self, bracket: char, kind: TokenKind, span: Span) -> Result<TokenKind, LexError> {
        let expected = match bracket {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        if self.brackets.pop() == Some(expected) {
            Ok(kind)
        } else {
            Err(LexError::new(LexErrorKind::UnmatchedBracket(bracket), span))
        }
    }
}

/// Layout tokens are consumed before conversion.
#[cold]
fn unreachable_layout(span: Span) -> Result<TokenKind, LexError> {
    Err(LexError::new(LexErrorKind::InvalidCharacter('\n'), span))
}

fn parse_int(digits: &str, radix: u32, span: Span) -> Result<i64, LexError> {
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&cleaned, radix).map_err(|_| LexError::new(LexErrorKind::IntOverflow, span))
}

#[cfg(test)]
mod tests;
