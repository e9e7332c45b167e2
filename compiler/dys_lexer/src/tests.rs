#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    let interner = StringInterner::new();
    lex(source, &interner).map(|t| t.kinds()).unwrap_or_default()
}

fn lex_err(source: &str) -> LexErrorKind {
    let interner = StringInterner::new();
    match lex(source, &interner) {
        Ok(tokens) => panic!("expected error, got {:?}", tokens.kinds()),
        Err(err) => err.kind,
    }
}

#[test]
fn empty_source_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("\n\n# only a comment\n"), vec![TokenKind::Eof]);
}

#[test]
fn simple_statement() {
    let interner = StringInterner::new();
    let tokens = lex("x = 1 + 2.5\n", &interner).unwrap();
    let x = interner.intern("x");
    assert_eq!(
        tokens.kinds(),
        vec![
            TokenKind::Ident(x),
            TokenKind::Assign,
            TokenKind::Int(1),
            TokenKind::Plus,
            TokenKind::Float(2.5f64.to_bits()),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn missing_trailing_newline_is_synthesized() {
    assert_eq!(
        kinds("pass"),
        vec![TokenKind::Pass, TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn indentation_produces_indent_and_dedent() {
    let src = "if x:\n    y\n    z\nw\n";
    let k = kinds(src);
    let indents = k.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = k.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!((indents, dedents), (1, 1));
    assert_eq!(k[3], TokenKind::Newline);
    assert_eq!(k[4], TokenKind::Indent);
}

#[test]
fn nested_blocks_close_at_eof() {
    let src = "def f():\n  if a:\n    return 1";
    let k = kinds(src);
    let tail: Vec<_> = k.iter().rev().take(4).copied().collect();
    assert_eq!(
        tail,
        vec![
            TokenKind::Eof,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Newline
        ]
    );
}

#[test]
fn blank_and_comment_lines_do_not_affect_layout() {
    let with_noise = kinds("if x:\n\n    # note\n    y\n");
    let without = kinds("if x:\n    y\n");
    assert_eq!(with_noise, without);
}

#[test]
fn newlines_inside_brackets_are_ignored() {
    let k = kinds("f(1,\n  2)\n");
    assert!(!k.contains(&TokenKind::Indent));
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
}

#[test]
fn backslash_continuation_joins_lines() {
    let k = kinds("x = 1 + \\\n    2\n");
    assert!(!k.contains(&TokenKind::Indent));
    assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
}

#[test]
fn tabs_expand_to_multiples_of_eight() {
    assert_eq!(indent_width("\t"), 8);
    assert_eq!(indent_width("  \t"), 8);
    assert_eq!(indent_width("\t "), 9);
    assert_eq!(indent_width(" \x0C  "), 2);
}

#[test]
fn inconsistent_dedent_is_an_error() {
    assert_eq!(
        lex_err("if x:\n    y\n  z\n"),
        LexErrorKind::InconsistentDedent
    );
}

#[test]
fn numeric_literals() {
    assert_eq!(kinds("0x_ff")[0], TokenKind::Int(255));
    assert_eq!(kinds("0o17")[0], TokenKind::Int(15));
    assert_eq!(kinds("0b101")[0], TokenKind::Int(5));
    assert_eq!(kinds("1_000_000")[0], TokenKind::Int(1_000_000));
    assert_eq!(kinds("1e3")[0], TokenKind::Float(1000f64.to_bits()));
    assert_eq!(kinds(".5")[0], TokenKind::Float(0.5f64.to_bits()));
}

#[test]
fn integer_overflow_is_reported() {
    assert_eq!(lex_err("99999999999999999999"), LexErrorKind::IntOverflow);
}

#[test]
fn complex_literals_are_rejected() {
    assert_eq!(lex_err("3j"), LexErrorKind::ComplexLiteral);
}

#[test]
fn string_token_records_prefix_and_body() {
    let interner = StringInterner::new();
    let src = "rb'a\\n' f\"{x}\" '''multi\nline'''";
    let tokens = lex(src, &interner).unwrap();
    let strs: Vec<StrToken> = tokens
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::Str(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(strs.len(), 3);
    assert_eq!(strs[0].prefix, StrPrefix::RAW | StrPrefix::BYTES);
    assert_eq!(&src[strs[0].body.to_range()], "a\\n");
    assert_eq!(strs[1].prefix, StrPrefix::FORMAT);
    assert_eq!(&src[strs[1].body.to_range()], "{x}");
    assert_eq!(strs[2].prefix, StrPrefix::empty());
    assert_eq!(&src[strs[2].body.to_range()], "multi\nline");
}

#[test]
fn triple_quoted_string_skips_escaped_quotes() {
    let interner = StringInterner::new();
    let src = r#""""a\"""b""""#;
    let tokens = lex(src, &interner).unwrap();
    let TokenKind::Str(s) = tokens[0].kind else {
        panic!("expected string, got {:?}", tokens[0].kind);
    };
    assert_eq!(&src[s.body.to_range()], r#"a\"""b"#);
}

#[test]
fn unterminated_string_is_reported() {
    assert_eq!(lex_err("x = 'abc\n"), LexErrorKind::UnterminatedString);
    assert_eq!(lex_err("x = b\"abc"), LexErrorKind::UnterminatedString);
    assert_eq!(lex_err("x = 'ab\\'\n"), LexErrorKind::UnterminatedString);
}

#[test]
fn very_long_string_literals_lex() {
    let interner = StringInterner::new();
    let body = "ab\\'".repeat(20_000);
    let src = format!("x = '{body}'\n");
    let tokens = lex(&src, &interner).unwrap();
    let TokenKind::Str(s) = tokens[2].kind else {
        panic!("expected string, got {:?}", tokens[2].kind);
    };
    assert_eq!(&src[s.body.to_range()], body);
}

#[test]
fn escaped_newline_continues_a_short_string() {
    let interner = StringInterner::new();
    let src = "'a\\\nb' 'c'";
    let tokens = lex(src, &interner).unwrap();
    let bodies: Vec<&str> = tokens
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::Str(s) => Some(&src[s.body.to_range()]),
            _ => None,
        })
        .collect();
    assert_eq!(bodies, vec!["a\\\nb", "c"]);
}

#[test]
fn invalid_character_is_reported() {
    assert_eq!(lex_err("x = $"), LexErrorKind::InvalidCharacter('$'));
}

#[test]
fn unmatched_brackets_are_reported() {
    assert_eq!(lex_err("x = (1]"), LexErrorKind::UnmatchedBracket(']'));
    assert_eq!(lex_err("x = [1, 2"), LexErrorKind::UnmatchedBracket('['));
}

#[test]
fn keywords_and_identifiers() {
    let interner = StringInterner::new();
    let tokens = lex("not_a_keyword not", &interner).unwrap();
    assert_eq!(
        tokens[0].kind,
        TokenKind::Ident(interner.intern("not_a_keyword"))
    );
    assert_eq!(tokens[1].kind, TokenKind::Not);
}

#[test]
fn fragment_is_shifted_and_has_no_layout() {
    let interner = StringInterner::new();
    let tokens = lex_fragment("a +\n b", 10, &interner).unwrap();
    assert_eq!(
        tokens.kinds(),
        vec![
            TokenKind::Ident(interner.intern("a")),
            TokenKind::Plus,
            TokenKind::Ident(interner.intern("b")),
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[0].span, Span::new(10, 11));
    assert_eq!(tokens[2].span, Span::new(15, 16));
}

#[test]
fn augmented_operators_are_single_tokens() {
    assert_eq!(
        kinds("a //= 2")[1..3].to_vec(),
        vec![TokenKind::DoubleSlashEq, TokenKind::Int(2)]
    );
    assert_eq!(kinds("a **= 2")[1], TokenKind::DoubleStarEq);
    assert_eq!(kinds("a := 2")[1], TokenKind::Walrus);
}

proptest! {
    #[test]
    fn decimal_integers_round_trip(n in 0i64..i64::MAX) {
        let interner = StringInterner::new();
        let tokens = lex(&n.to_string(), &interner).unwrap();
        prop_assert_eq!(tokens[0].kind, TokenKind::Int(n));
    }

    #[test]
    fn indent_and_dedent_balance(depths in proptest::collection::vec(0usize..4, 1..12)) {
        let mut src = String::new();
        let mut level = 0usize;
        for d in depths {
            // Only indent one level deeper than the previous line.
            let next = d.min(level + 1);
            if next > level {
                src.push_str(&"    ".repeat(level));
                src.push_str("if x:\n");
            }
            level = next;
            src.push_str(&"    ".repeat(level));
            src.push_str("pass\n");
        }
        let k = kinds(&src);
        let indents = k.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = k.iter().filter(|k| **k == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
        prop_assert_eq!(k.last().copied(), Some(TokenKind::Eof));
    }
}
