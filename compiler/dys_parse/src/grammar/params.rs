//! Parameter lists for `def` (annotations allowed) and `lambda`.

use dys_ir::{Param, Parameters, TokenKind};
use rustc_hash::FxHashSet;

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Parse parameters up to (not including) `close`.
    pub(crate) fn parse_parameters(
        &mut self,
        close: TokenKind,
        annotations: bool,
    ) -> Result<Parameters, ParseError> {
        let mut params = Parameters::default();
        let mut seen = FxHashSet::default();
        let mut after_star = false;
        let mut bare_star = None;
        let mut seen_default = false;

        while !self.check(close) {
            match self.current_kind() {
                TokenKind::Slash => {
                    let span = self.cursor.advance().span;
                    if after_star || !params.posonly.is_empty() || params.args.is_empty() {
                        return Err(ParseError::new("invalid syntax", span));
                    }
                    params.posonly = std::mem::take(&mut params.args);
                }
                TokenKind::Star => {
                    let span = self.cursor.advance().span;
                    if after_star {
                        return Err(ParseError::new("* argument may appear only once", span));
                    }
                    after_star = true;
                    if matches!(self.current_kind(), TokenKind::Comma) || self.check(close) {
                        bare_star = Some(span);
                    } else {
                        params.vararg = Some(self.parse_param(annotations, false, &mut seen)?);
                    }
                }
                TokenKind::DoubleStar => {
                    self.cursor.advance();
                    params.kwarg = Some(self.parse_param(annotations, false, &mut seen)?);
                    self.eat(TokenKind::Comma);
                    if !self.check(close) {
                        return Err(ParseError::new(
                            "arguments cannot follow var-keyword argument",
                            self.current_span(),
                        ));
                    }
                    break;
                }
                _ => {
                    let param = self.parse_param(annotations, true, &mut seen)?;
                    if after_star {
                        bare_star = None;
                        params.kwonly.push(param);
                    } else {
                        if param.default.is_some() {
                            seen_default = true;
                        } else if seen_default {
                            return Err(ParseError::new(
                                "non-default argument follows default argument",
                                param.span,
                            ));
                        }
                        params.args.push(param);
                    }
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if let Some(span) = bare_star {
            return Err(ParseError::new("named arguments must follow bare *", span));
        }
        Ok(params)
    }

    fn parse_param(
        &mut self,
        annotations: bool,
        allow_default: bool,
        seen: &mut FxHashSet<dys_ir::Name>,
    ) -> Result<Param, ParseError> {
        let (name, start) = self.parse_name()?;
        if !seen.insert(name) {
            return Err(ParseError::new(
                format!(
                    "duplicate argument '{}' in function definition",
                    self.interner.lookup(name)
                ),
                start,
            ));
        }
        let annotation = if annotations && self.eat(TokenKind::Colon) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let span = self.span_from(start);
        let default = if allow_default && self.eat(TokenKind::Assign) {
            Some(self.parse_test()?)
        } else {
            None
        };
        Ok(Param {
            name,
            annotation,
            default,
            span,
        })
    }
}
