//! `repr()` and `str()` of values, and cheap size estimates.
//!
//! Output matches Python character for character where
//! scripts can observe it: float shortest-repr, string quoting, container
//! punctuation, and `[...]` for self-referencing containers.

use std::fmt::Write as _;

use dys_stack::ensure_sufficient_stack;

use super::{Method, Value};

/// Containers currently being printed, by address.
#[derive(Default)]
struct ReprGuard {
    active: Vec<usize>,
}

impl ReprGuard {
    fn enter(&mut self, addr: usize) -> bool {
        if self.active.contains(&addr) {
            return false;
        }
        self.active.push(addr);
        true
    }

    fn exit(&mut self) {
        self.active.pop();
    }
}

/// Container address used for cycle detection, if the value can contain
/// itself.
fn container_addr(value: &Value) -> Option<usize> {
    match value {
        Value::List(l) => Some(std::rc::Rc::as_ptr(l) as usize),
        Value::Dict(d) => Some(std::rc::Rc::as_ptr(d) as usize),
        Value::Set(s) => Some(std::rc::Rc::as_ptr(s) as usize),
        Value::Instance(i) => Some(std::rc::Rc::as_ptr(i) as usize),
        _ => None,
    }
}

impl Value {
    /// `repr(value)`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        write_repr(&mut out, self, &mut ReprGuard::default());
        out
    }

    /// `str(value)`.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Exception(exc) => exc.message(),
            Value::Module(m) => match &m.form {
                Some(form) => form.text.to_string(),
                None => self.repr(),
            },
            _ => self.repr(),
        }
    }

    /// Length of `repr(value)`, computed lazily and abandoned once it passes
    /// `cap`. String contents count without escapes.
    pub fn estimate_len(&self, cap: usize) -> usize {
        let mut total = 0;
        estimate_into(self, cap, &mut total, &mut ReprGuard::default());
        total
    }
}

fn write_repr(out: &mut String, value: &Value, guard: &mut ReprGuard) {
    ensure_sufficient_stack(|| write_repr_inner(out, value, guard));
}

fn write_seq<'v>(
    out: &mut String,
    items: impl Iterator<Item = &'v Value>,
    guard: &mut ReprGuard,
) -> usize {
    let mut count = 0;
    for item in items {
        if count > 0 {
            out.push_str(", ");
        }
        write_repr(out, item, guard);
        count += 1;
    }
    count
}

fn write_repr_inner(out: &mut String, value: &Value, guard: &mut ReprGuard) {
    if let Some(addr) = container_addr(value) {
        if !guard.enter(addr) {
            out.push_str(match value {
                Value::List(_) => "[...]",
                _ => "{...}",
            });
            return;
        }
    }
    match value {
        Value::None => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::Str(s) => out.push_str(&repr_str(s)),
        Value::Bytes(b) => out.push_str(&repr_bytes(b)),
        Value::List(items) => {
            out.push('[');
            write_seq(out, items.borrow().iter(), guard);
            out.push(']');
        }
        Value::Tuple(items) => {
            out.push('(');
            if write_seq(out, items.iter(), guard) == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Value::Dict(dict) => {
            out.push('{');
            for (i, (k, v)) in dict.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, k, guard);
                out.push_str(": ");
                write_repr(out, v, guard);
            }
            out.push('}');
        }
        Value::Set(set) => {
            let set = set.borrow();
            if set.is_empty() {
                out.push_str("set()");
            } else {
                out.push('{');
                write_seq(out, set.iter(), guard);
                out.push('}');
            }
        }
        Value::FrozenSet(set) => {
            if set.is_empty() {
                out.push_str("frozenset()");
            } else {
                out.push_str("frozenset({");
                write_seq(out, set.iter(), guard);
                out.push_str("})");
            }
        }
        Value::Range(r) => {
            if r.step == 1 {
                let _ = write!(out, "range({}, {})", r.start, r.stop);
            } else {
                let _ = write!(out, "range({}, {}, {})", r.start, r.stop, r.step);
            }
        }
        Value::Slice(s) => {
            out.push_str("slice(");
            write_repr(out, &s.lower, guard);
            out.push_str(", ");
            write_repr(out, &s.upper, guard);
            out.push_str(", ");
            write_repr(out, &s.step, guard);
            out.push(')');
        }
        Value::Ellipsis => out.push_str("Ellipsis"),
        Value::Function(f) => {
            let _ = write!(out, "<function {}>", f.name);
        }
        Value::Native(f) => {
            let _ = write!(out, "<built-in function {}>", f.id.name);
        }
        Value::Blocked(b) => {
            let _ = write!(out, "<built-in function {}>", b.name());
        }
        Value::BoundMethod(m) => match &m.method {
            Method::Primitive(p) => {
                let _ = write!(out, "<built-in method {} of {} object>", p.name, p.owner.name());
            }
            Method::Callable(callable) => {
                let name = match callable {
                    Value::Function(f) => f.name.to_string(),
                    other => other.repr(),
                };
                let _ = write!(out, "<bound method {name} of ");
                write_repr(out, &m.receiver, guard);
                out.push('>');
            }
        },
        Value::ClassMethod(_) => out.push_str("<classmethod object>"),
        Value::Type(ty) => {
            let _ = write!(out, "<class '{}'>", ty.name());
        }
        Value::ExceptionType(ty) => {
            let _ = write!(out, "<class '{}'>", ty.name());
        }
        Value::Class(c) => {
            let _ = write!(out, "<class 'script.{}'>", c.name);
        }
        Value::Instance(i) => {
            let _ = write!(out, "<script.{} object>", i.class.name);
        }
        Value::Exception(exc) => {
            let _ = write!(out, "{}(", exc.class_name());
            write_seq(out, exc.args.iter(), guard);
            out.push(')');
        }
        Value::Module(m) => match &m.form {
            Some(form) => out.push_str(&form.repr),
            None => {
                let _ = write!(out, "<module '{}'>", m.name);
            }
        },
    }
    if container_addr(value).is_some() {
        guard.exit();
    }
}

fn estimate_into(value: &Value, cap: usize, total: &mut usize, guard: &mut ReprGuard) {
    if *total > cap {
        return;
    }
    ensure_sufficient_stack(|| estimate_inner(value, cap, total, guard));
}

fn estimate_items<'v>(
    items: impl Iterator<Item = &'v Value>,
    cap: usize,
    total: &mut usize,
    guard: &mut ReprGuard,
) {
    for (i, item) in items.enumerate() {
        if *total > cap {
            return;
        }
        if i > 0 {
            *total += 2;
        }
        estimate_into(item, cap, total, guard);
    }
}

fn estimate_inner(value: &Value, cap: usize, total: &mut usize, guard: &mut ReprGuard) {
    if let Some(addr) = container_addr(value) {
        if !guard.enter(addr) {
            *total += 5;
            return;
        }
    }
    match value {
        Value::Str(s) => *total += s.len() + 2,
        Value::Bytes(b) => *total += b.len() + 3,
        Value::List(items) => {
            *total += 2;
            estimate_items(items.borrow().iter(), cap, total, guard);
        }
        Value::Tuple(items) => {
            *total += if items.len() == 1 { 3 } else { 2 };
            estimate_items(items.iter(), cap, total, guard);
        }
        Value::Dict(dict) => {
            *total += 2;
            for (i, (k, v)) in dict.borrow().iter().enumerate() {
                if *total > cap {
                    break;
                }
                *total += if i > 0 { 4 } else { 2 };
                estimate_into(k, cap, total, guard);
                estimate_into(v, cap, total, guard);
            }
        }
        Value::Set(set) => {
            *total += 2;
            estimate_items(set.borrow().iter(), cap, total, guard);
        }
        Value::FrozenSet(set) => {
            *total += 13;
            estimate_items(set.iter(), cap, total, guard);
        }
        other => *total += other.repr().len(),
    }
    if container_addr(value).is_some() {
        guard.exit();
    }
}

/// Shortest round-tripping float text: `0.1`, `1.0`, `1e+16`, `1.5e-05`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{f:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let mut fixed = format!("{f}");
        if !fixed.contains('.') {
            fixed.push_str(".0");
        }
        fixed
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

fn quote_for(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn push_escaped_char(out: &mut String, c: char, quote: char, ascii_only: bool) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() || (ascii_only && !c.is_ascii()) => {
            let code = u32::from(c);
            let _ = if code < 0x100 {
                write!(out, "\\x{code:02x}")
            } else if code < 0x10000 {
                write!(out, "\\u{code:04x}")
            } else {
                write!(out, "\\U{code:08x}")
            };
        }
        c => out.push(c),
    }
}

fn quote_str(s: &str, ascii_only: bool) -> String {
    let quote = quote_for(s.contains('\''), s.contains('"'));
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        push_escaped_char(&mut out, c, quote, ascii_only);
    }
    out.push(quote);
    out
}

/// Quoted string literal as `repr` shows it.
pub fn repr_str(s: &str) -> String {
    quote_str(s, false)
}

/// `ascii(value)`: like `repr` with every non-ASCII character escaped.
pub fn ascii_repr(value: &Value) -> String {
    match value {
        Value::Str(s) => quote_str(s, true),
        other => {
            let mut out = String::new();
            for c in other.repr().chars() {
                push_escaped_char(&mut out, c, '\0', true);
            }
            out
        }
    }
}

/// Bytes literal as `repr` shows it.
pub fn repr_bytes(bytes: &[u8]) -> String {
    let quote = quote_for(bytes.contains(&b'\''), bytes.contains(&b'"'));
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if char::from(b) == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(char::from(b)),
            b => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push(quote);
    out
}
