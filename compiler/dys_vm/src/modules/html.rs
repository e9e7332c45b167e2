//! `html`: `escape` and `unescape`.
//!
//! `unescape` knows numeric references and the common named entities;
//! unknown names are left as written.

use dys_eval::errors::type_error;
use dys_eval::{native, CallArgs, EvalResult, Interpreter, ModuleBuilder, ModuleValue, Session, Value};

const ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("trade", '\u{2122}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("euro", '\u{20ac}'),
    ("pound", '\u{a3}'),
    ("yen", '\u{a5}'),
    ("cent", '\u{a2}'),
    ("sect", '\u{a7}'),
    ("deg", '\u{b0}'),
    ("plusmn", '\u{b1}'),
    ("times", '\u{d7}'),
    ("divide", '\u{f7}'),
    ("middot", '\u{b7}'),
    ("laquo", '\u{ab}'),
    ("raquo", '\u{bb}'),
];

fn text_arg(args: &CallArgs, func: &str) -> EvalResult<std::rc::Rc<str>> {
    match args.arg(0) {
        Value::Str(s) => Ok(s),
        other => Err(type_error(format!(
            "{func}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

pub fn escape_text(s: &str, quote: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            '\'' if quote => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// The character a reference body (`amp`, `#39`, `#x27`) stands for.
fn resolve(reference: &str) -> Option<char> {
    if let Some(number) = reference.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return Some(match code {
            0 | 0xD800..=0xDFFF => '\u{fffd}',
            code => char::from_u32(code).unwrap_or('\u{fffd}'),
        });
    }
    ENTITIES
        .iter()
        .find(|(name, _)| *name == reference)
        .map(|&(_, c)| c)
}

pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let body_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .unwrap_or(after.len());
        let body = &after[..body_len];
        match resolve(body) {
            Some(c) if !body.is_empty() => {
                out.push(c);
                rest = after[body_len..].strip_prefix(';').unwrap_or(&after[body_len..]);
            }
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("escape", 1, 2)?;
    let quote = args.take(1, "quote").map_or(true, |v| v.is_truthy());
    args.no_extra_keywords("escape")?;
    Ok(Value::string(escape_text(&text_arg(&args, "escape")?, quote)))
}

fn unescape(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("unescape", 1, 1)?;
    Ok(Value::string(unescape_text(&text_arg(&args, "unescape")?)))
}

pub fn module(session: &Session) -> ModuleValue {
    ModuleBuilder::new("html", Some("General functions for HTML manipulation."))
        .function(
            "escape",
            Some("Replace special characters \"&\", \"<\" and \">\" to HTML-safe sequences."),
            native(escape),
        )
        .function(
            "unescape",
            Some("Convert all named and numeric character references in the string s to the corresponding unicode characters."),
            native(unescape),
        )
        .build(session.interner())
}
