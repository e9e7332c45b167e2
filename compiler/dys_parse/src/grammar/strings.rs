//! String literals: implicit concatenation, bytes, and f-strings.
//!
//! Adjacent literals form one expression. Plain pieces are cooked with the
//! lexer's escape rules; any `f` piece turns the whole run into a
//! `JoinedStr` of `Constant` and `FormattedValue` parts. Field expressions
//! are lexed from their source text so their spans point into the program.

use dys_ir::{Constant, Conversion, ExprId, ExprKind, Span, StrPrefix, TokenKind};
use dys_lexer::{cook_bytes, cook_str, lex_fragment};

use crate::{Cursor, ParseError, Parser};

/// f-string fields may nest once inside a format spec.
const MAX_FSTRING_NESTING: u8 = 2;

enum Piece {
    Literal(String),
    Field(ExprId),
}

/// Accumulates the parts of a (possibly formatted) string.
#[derive(Default)]
struct Pieces {
    pieces: Vec<Piece>,
}

impl Pieces {
    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Literal(last)) = self.pieces.last_mut() {
            last.push_str(text);
        } else {
            self.pieces.push(Piece::Literal(text.to_owned()));
        }
    }

    fn push_field(&mut self, field: ExprId) {
        self.pieces.push(Piece::Field(field));
    }

    /// Concatenation of the literal pieces (used when nothing was formatted).
    fn into_plain(self) -> String {
        let mut out = String::new();
        for piece in self.pieces {
            if let Piece::Literal(text) = piece {
                out.push_str(&text);
            }
        }
        out
    }
}

/// Position of `{`/`}`/`!`/`:` scanning state inside a field expression.
struct FieldEnd {
    /// Index one past the expression text.
    end: usize,
    /// `{x=}` self-documenting form.
    debug: bool,
}

impl<'a> Parser<'a> {
    /// One or more adjacent string tokens.
    pub(crate) fn parse_strings(&mut self) -> Result<ExprId, ParseError> {
        let source: &'a str = self.source;
        let start = self.current_span();
        let mut pieces = Pieces::default();
        let mut bytes: Vec<u8> = Vec::new();
        let mut saw_bytes = false;
        let mut saw_str = false;
        let mut formatted = false;

        while let TokenKind::Str(token) = self.current_kind() {
            let token_span = self.cursor.advance().span;
            let raw = &source[token.body.to_range()];
            let is_raw = token.prefix.contains(StrPrefix::RAW);
            if token.prefix.contains(StrPrefix::BYTES) {
                saw_bytes = true;
                let cooked = cook_bytes(raw, is_raw)
                    .map_err(|kind| ParseError::new(kind.to_string(), token_span))?;
                bytes.extend_from_slice(&cooked);
            } else if token.prefix.contains(StrPrefix::FORMAT) {
                saw_str = true;
                formatted = true;
                self.parse_fstring_parts(raw, token.body.start, 0, is_raw, 0, &mut pieces, token_span)?;
            } else {
                saw_str = true;
                let cooked = cook_str(raw, is_raw)
                    .map_err(|kind| ParseError::new(kind.to_string(), token_span))?;
                pieces.push_literal(&cooked);
            }
            if saw_bytes && saw_str {
                return Err(ParseError::new(
                    "cannot mix bytes and nonbytes literals",
                    self.span_from(start),
                ));
            }
        }

        let span = self.span_from(start);
        let kind = if saw_bytes {
            ExprKind::Constant(Constant::Bytes(bytes.into_boxed_slice()))
        } else if !formatted {
            ExprKind::Constant(Constant::Str(pieces.into_plain().into_boxed_str()))
        } else {
            ExprKind::JoinedStr(self.finish_pieces(pieces, span))
        };
        Ok(self.alloc_expr(kind, span))
    }

    fn finish_pieces(&mut self, pieces: Pieces, span: Span) -> Vec<ExprId> {
        pieces
            .pieces
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(text) => self.alloc_expr(
                    ExprKind::Constant(Constant::Str(text.into_boxed_str())),
                    span,
                ),
                Piece::Field(id) => id,
            })
            .collect()
    }

    /// Parse f-string text starting at `pos`.
    ///
    /// At nesting 0 this consumes the whole body. Inside a format spec it
    /// stops at the `}` closing the enclosing field and returns its index.
    #[allow(clippy::too_many_arguments, reason = "recursive scanner state")]
    fn parse_fstring_parts(
        &mut self,
        raw: &'a str,
        base: u32,
        mut pos: usize,
        is_raw: bool,
        nesting: u8,
        out: &mut Pieces,
        outer_span: Span,
    ) -> Result<usize, ParseError> {
        let bytes = raw.as_bytes();
        let in_spec = nesting > 0;
        let mut literal_start = pos;

        while pos < bytes.len() {
            match bytes[pos] {
                b'{' if !in_spec && bytes.get(pos + 1) == Some(&b'{') => {
                    self.push_fstring_literal(&raw[literal_start..pos], is_raw, out, outer_span)?;
                    out.push_literal("{");
                    pos += 2;
                    literal_start = pos;
                }
                b'}' if !in_spec && bytes.get(pos + 1) == Some(&b'}') => {
                    self.push_fstring_literal(&raw[literal_start..pos], is_raw, out, outer_span)?;
                    out.push_literal("}");
                    pos += 2;
                    literal_start = pos;
                }
                b'}' if in_spec => {
                    self.push_fstring_literal(&raw[literal_start..pos], is_raw, out, outer_span)?;
                    return Ok(pos);
                }
                b'}' => {
                    return Err(ParseError::new(
                        "f-string: single '}' is not allowed",
                        fstring_span(base, pos),
                    ));
                }
                b'{' => {
                    self.push_fstring_literal(&raw[literal_start..pos], is_raw, out, outer_span)?;
                    if nesting >= MAX_FSTRING_NESTING {
                        return Err(ParseError::new(
                            "f-string: expressions nested too deeply",
                            fstring_span(base, pos),
                        ));
                    }
                    pos = self.parse_fstring_field(raw, base, pos + 1, is_raw, nesting, out, outer_span)?;
                    literal_start = pos;
                }
                _ => pos += 1,
            }
        }

        if in_spec {
            return Err(ParseError::new(
                "f-string: expecting '}'",
                fstring_span(base, pos),
            ));
        }
        self.push_fstring_literal(&raw[literal_start..pos], is_raw, out, outer_span)?;
        Ok(pos)
    }

    fn push_fstring_literal(
        &self,
        text: &str,
        is_raw: bool,
        out: &mut Pieces,
        span: Span,
    ) -> Result<(), ParseError> {
        let cooked =
            cook_str(text, is_raw).map_err(|kind| ParseError::new(kind.to_string(), span))?;
        out.push_literal(&cooked);
        Ok(())
    }

    /// Parse one `{expr[=][!c][:spec]}` field; `pos` is just past the `{`.
    /// Returns the index just past the closing `}`.
    #[allow(clippy::too_many_arguments, reason = "recursive scanner state")]
    fn parse_fstring_field(
        &mut self,
        raw: &'a str,
        base: u32,
        pos: usize,
        is_raw: bool,
        nesting: u8,
        out: &mut Pieces,
        outer_span: Span,
    ) -> Result<usize, ParseError> {
        let bytes = raw.as_bytes();
        let FieldEnd { end, debug } = scan_field_expression(raw, base, pos)?;
        let text = &raw[pos..end];
        if text.trim().is_empty() {
            return Err(ParseError::new(
                "f-string: empty expression not allowed",
                fstring_span(base, pos),
            ));
        }

        let value = self.parse_fragment(text, base + offset(pos))?;
        let mut cursor = end;
        if debug {
            out.push_literal(&raw[pos..=end]);
            cursor += 1;
        }

        let mut conversion = None;
        if bytes.get(cursor) == Some(&b'!') {
            conversion = Some(match bytes.get(cursor + 1) {
                Some(b's') => Conversion::Str,
                Some(b'r') => Conversion::Repr,
                Some(b'a') => Conversion::Ascii,
                _ => {
                    return Err(ParseError::new(
                        "f-string: invalid conversion character: expected 's', 'r', or 'a'",
                        fstring_span(base, cursor),
                    ))
                }
            });
            cursor += 2;
        }

        let mut format_spec = None;
        if bytes.get(cursor) == Some(&b':') {
            let mut spec = Pieces::default();
            cursor =
                self.parse_fstring_parts(raw, base, cursor + 1, is_raw, nesting + 1, &mut spec, outer_span)?;
            let parts = self.finish_pieces(spec, outer_span);
            format_spec = Some(self.alloc_expr(ExprKind::JoinedStr(parts), outer_span));
        }

        if bytes.get(cursor) != Some(&b'}') {
            return Err(ParseError::new(
                "f-string: expecting '}'",
                fstring_span(base, cursor),
            ));
        }

        if debug && conversion.is_none() && format_spec.is_none() {
            conversion = Some(Conversion::Repr);
        }
        let field = self.alloc_expr(
            ExprKind::FormattedValue {
                value,
                conversion,
                format_spec,
            },
            outer_span,
        );
        out.push_field(field);
        Ok(cursor + 1)
    }

    /// Parse a field expression with a temporary cursor over its tokens.
    fn parse_fragment(&mut self, text: &str, base: u32) -> Result<ExprId, ParseError> {
        let tokens = lex_fragment(text, base, self.interner)?;
        let saved = std::mem::replace(&mut self.cursor, Cursor::new(tokens));
        let result = self.parse_fragment_expression();
        self.cursor = saved;
        result
    }

    fn parse_fragment_expression(&mut self) -> Result<ExprId, ParseError> {
        let expr = if self.check(TokenKind::Yield) {
            self.parse_yield()?
        } else {
            self.parse_star_expressions()?
        };
        if !self.cursor.is_at_end() {
            return Err(ParseError::new(
                "f-string: invalid syntax",
                self.current_span(),
            ));
        }
        Ok(expr)
    }
}

fn offset(pos: usize) -> u32 {
    u32::try_from(pos).unwrap_or(u32::MAX)
}

fn fstring_span(base: u32, pos: usize) -> Span {
    let at = base.saturating_add(offset(pos));
    Span::new(at, at.saturating_add(1))
}

/// Find where the expression text of a field ends.
fn scan_field_expression(raw: &str, base: u32, start: usize) -> Result<FieldEnd, ParseError> {
    let bytes = raw.as_bytes();
    let mut depth = 0u32;
    let mut quote: Option<u8> = None;
    let mut pos = start;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'\\' {
            return Err(ParseError::new(
                "f-string expression part cannot include a backslash",
                fstring_span(base, pos),
            ));
        }
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            pos += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'#' => {
                return Err(ParseError::new(
                    "f-string expression part cannot include '#'",
                    fstring_span(base, pos),
                ))
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' => {
                if depth == 0 {
                    return Err(ParseError::new(
                        format!("f-string: unmatched '{}'", b as char),
                        fstring_span(base, pos),
                    ));
                }
                depth -= 1;
            }
            b'}' if depth > 0 => depth -= 1,
            b'}' => return Ok(FieldEnd { end: pos, debug: false }),
            b'!' if depth == 0 && bytes.get(pos + 1) != Some(&b'=') => {
                return Ok(FieldEnd { end: pos, debug: false })
            }
            b':' if depth == 0 => return Ok(FieldEnd { end: pos, debug: false }),
            b'=' if depth == 0 => {
                let prev = if pos > start { bytes[pos - 1] } else { b' ' };
                let next = bytes.get(pos + 1).copied();
                let comparison = matches!(prev, b'=' | b'!' | b'<' | b'>')
                    || next == Some(b'=');
                if !comparison && matches!(next, Some(b'}' | b'!' | b':')) {
                    return Ok(FieldEnd { end: pos, debug: true });
                }
            }
            _ => {}
        }
        pos += 1;
    }

    Err(ParseError::new(
        "f-string: expecting '}'",
        fstring_span(base, pos),
    ))
}
