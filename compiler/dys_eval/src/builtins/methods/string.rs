//! `str` methods. Positions and widths count characters, not bytes.

use std::rc::Rc;

use crate::accounting::ResourceLimits;
use crate::builtins::convert::index_arg;
use crate::errors::{
    attribute_error, exception, resource, type_error, value_error, EvalError, EvalResult,
    ResourceKind,
};
use crate::interpreter::Interpreter;
use crate::iter::iterate;
use crate::native::CallArgs;
use crate::sequence::slice_indices;
use crate::value::{ExcType, SliceValue, Value};

fn too_long() -> EvalError {
    resource(
        ResourceKind::ValueSize,
        "Sorry, I will not evaluate something this long.",
    )
}

fn check_len(len: usize, limits: &ResourceLimits) -> EvalResult<()> {
    if len > limits.max_string_length {
        return Err(too_long());
    }
    Ok(())
}

fn str_arg(value: &Value, func: &str) -> EvalResult<Rc<str>> {
    match value {
        Value::Str(s) => Ok(Rc::clone(s)),
        other => Err(type_error(format!(
            "{func}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

fn optional_str(value: Option<Value>, func: &str) -> EvalResult<Option<Rc<str>>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(value) => str_arg(&value, func).map(Some),
    }
}

fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

/// The `[start:end]` window of `s`, as a char offset and the substring.
fn window<'s>(s: &'s str, start: Option<Value>, end: Option<Value>) -> EvalResult<(usize, &'s str)> {
    let slice = SliceValue {
        lower: start.unwrap_or(Value::None),
        upper: end.unwrap_or(Value::None),
        step: Value::None,
    };
    let (lo, hi, _) = slice_indices(&slice, s.chars().count())?;
    let lo = usize::try_from(lo).unwrap_or(0);
    let hi = usize::try_from(hi).unwrap_or(0);
    if hi < lo {
        return Ok((lo, ""));
    }
    Ok((lo, &s[byte_offset(s, lo)..byte_offset(s, hi)]))
}

fn char_pos(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

fn find(s: &str, args: &CallArgs, func: &str, from_right: bool) -> EvalResult<Option<usize>> {
    args.arity(func, 1, 3)?;
    let sub = str_arg(&args.arg(0), func)?;
    let end = args.positional.get(2).cloned();
    let start = args.positional.get(1).cloned();
    let (offset, hay) = window(s, start, end)?;
    let found = if from_right { hay.rfind(&*sub) } else { hay.find(&*sub) };
    Ok(found.map(|byte| offset + char_pos(hay, byte)))
}

fn to_index(i: usize) -> Value {
    Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
}

/// Split on runs of whitespace, at most `max` times (from the right when
/// `from_right`).
fn split_whitespace(s: &str, max: Option<usize>, from_right: bool) -> Vec<String> {
    let mut parts = Vec::new();
    if from_right {
        let mut rest = s.trim_end();
        while !rest.is_empty() {
            if max.is_some_and(|m| parts.len() == m) {
                parts.push(rest.to_string());
                break;
            }
            match rest.rfind(char::is_whitespace) {
                Some(i) => {
                    let ws_len = rest[i..].chars().next().map_or(1, char::len_utf8);
                    parts.push(rest[i + ws_len..].to_string());
                    rest = rest[..i].trim_end();
                }
                None => {
                    parts.push(rest.to_string());
                    break;
                }
            }
        }
        parts.reverse();
    } else {
        let mut rest = s.trim_start();
        while !rest.is_empty() {
            if max.is_some_and(|m| parts.len() == m) {
                parts.push(rest.to_string());
                break;
            }
            match rest.find(char::is_whitespace) {
                Some(i) => {
                    parts.push(rest[..i].to_string());
                    rest = rest[i..].trim_start();
                }
                None => {
                    parts.push(rest.to_string());
                    break;
                }
            }
        }
    }
    parts
}

fn split(s: &str, mut args: CallArgs, func: &str, from_right: bool) -> EvalResult {
    let sep = args.take(0, "sep");
    let maxsplit = args.take(1, "maxsplit");
    args.no_extra_keywords(func)?;
    args.positional_arity(func, 0, 2)?;
    let max = match maxsplit {
        Some(m) => usize::try_from(index_arg(&m)?).ok(),
        None => None,
    };
    let parts: Vec<String> = match optional_str(sep, func)? {
        None => split_whitespace(s, max, from_right),
        Some(sep) if sep.is_empty() => return Err(value_error("empty separator")),
        Some(sep) => match (max, from_right) {
            (None, _) => s.split(&*sep).map(str::to_string).collect(),
            (Some(m), false) => s.splitn(m + 1, &*sep).map(str::to_string).collect(),
            (Some(m), true) => {
                let mut parts: Vec<String> = s.rsplitn(m + 1, &*sep).map(str::to_string).collect();
                parts.reverse();
                parts
            }
        },
    };
    Ok(Value::list(parts.into_iter().map(Value::string).collect()))
}

const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

fn splitlines(s: &str, keepends: bool) -> Vec<Value> {
    let mut lines = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        match rest.find(LINE_BREAKS) {
            Some(i) => {
                let brk = if rest[i..].starts_with("\r\n") {
                    2
                } else {
                    rest[i..].chars().next().map_or(1, char::len_utf8)
                };
                let end = if keepends { i + brk } else { i };
                lines.push(Value::str(&rest[..end]));
                rest = &rest[i + brk..];
            }
            None => {
                lines.push(Value::str(rest));
                break;
            }
        }
    }
    lines
}

fn strip_chars(chars: Option<Rc<str>>) -> impl Fn(char) -> bool {
    move |c| match &chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    }
}

fn pad(
    s: &str,
    args: CallArgs,
    func: &str,
    limits: &ResourceLimits,
    place: fn(usize, usize) -> usize,
) -> EvalResult {
    args.arity(func, 1, 2)?;
    let width = usize::try_from(index_arg(&args.arg(0))?).unwrap_or(0);
    check_len(width, limits)?;
    let fill = match args.get(1) {
        Some(value) => {
            let fill = str_arg(value, func)?;
            let mut chars = fill.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(type_error(
                        "The fill character must be exactly one character long",
                    ))
                }
            }
        }
        None => ' ',
    };
    let len = s.chars().count();
    if width <= len {
        return Ok(Value::str(s));
    }
    let total = width - len;
    let left = place(total, width);
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(s);
    out.extend(std::iter::repeat(fill).take(total - left));
    Ok(Value::string(out))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_alphabetic();
    }
    out
}

fn is_title(s: &str) -> bool {
    let mut prev_cased = false;
    let mut any_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else {
            prev_cased = false;
        }
    }
    any_cased
}

fn swapcase(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            let swapped: Vec<char> = if c.is_uppercase() {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            swapped
        })
        .collect()
}

fn expandtabs(s: &str, tabsize: usize, limits: &ResourceLimits) -> EvalResult<String> {
    let mut out = String::new();
    let mut column = 0;
    for c in s.chars() {
        match c {
            '\t' if tabsize > 0 => {
                let spaces = tabsize - column % tabsize;
                column += spaces;
                out.extend(std::iter::repeat(' ').take(spaces));
            }
            '\t' => {}
            '\n' | '\r' => {
                column = 0;
                out.push(c);
            }
            _ => {
                column += 1;
                out.push(c);
            }
        }
        check_len(column, limits)?;
    }
    Ok(out)
}

fn zfill(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if width <= len {
        return s.to_string();
    }
    let zeros = "0".repeat(width - len);
    match s.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{zeros}{}", &s[1..]),
        _ => format!("{zeros}{s}"),
    }
}

/// Predicate methods; an empty string is never true except for `isascii`.
fn predicate(s: &str, name: &str) -> Option<bool> {
    let all = |f: fn(char) -> bool| !s.is_empty() && s.chars().all(f);
    let cased = || s.chars().any(|c| c.is_lowercase() || c.is_uppercase());
    Some(match name {
        "isalnum" => all(char::is_alphanumeric),
        "isalpha" => all(char::is_alphabetic),
        "isascii" => s.is_ascii(),
        "isdecimal" | "isdigit" => all(|c| c.is_ascii_digit()),
        "isnumeric" => all(char::is_numeric),
        "isspace" => all(char::is_whitespace),
        "islower" => cased() && !s.chars().any(char::is_uppercase),
        "isupper" => cased() && !s.chars().any(char::is_lowercase),
        "istitle" => is_title(s),
        _ => return None,
    })
}

fn affix_match(s: &str, args: CallArgs, func: &str, suffix: bool) -> EvalResult {
    args.arity(func, 1, 3)?;
    let end = args.positional.get(2).cloned();
    let start = args.positional.get(1).cloned();
    let (_, hay) = window(s, start, end)?;
    let test = |candidate: &Value| -> EvalResult<bool> {
        let candidate = candidate.as_str().ok_or_else(|| {
            type_error(format!(
                "{func} first arg must be str or a tuple of str, not {}",
                candidate.type_name()
            ))
        })?;
        Ok(if suffix {
            hay.ends_with(candidate)
        } else {
            hay.starts_with(candidate)
        })
    };
    match args.arg(0) {
        Value::Tuple(options) => {
            for option in options.iter() {
                if test(option)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        other => test(&other).map(Value::Bool),
    }
}

fn partition(s: &str, args: &CallArgs, func: &str, from_right: bool) -> EvalResult {
    args.arity(func, 1, 1)?;
    let sep = str_arg(&args.arg(0), func)?;
    if sep.is_empty() {
        return Err(value_error("empty separator"));
    }
    let found = if from_right { s.rfind(&*sep) } else { s.find(&*sep) };
    let parts = match found {
        Some(i) => [&s[..i], &*sep, &s[i + sep.len()..]],
        None if from_right => ["", "", s],
        None => [s, "", ""],
    };
    Ok(Value::tuple(parts.into_iter().map(Value::str).collect()))
}

fn join(s: &str, args: &CallArgs, limits: &ResourceLimits) -> EvalResult {
    args.arity("join", 1, 1)?;
    let mut out = String::new();
    for (index, item) in iterate(&args.arg(0))?.enumerate() {
        let Value::Str(part) = &item else {
            return Err(type_error(format!(
                "sequence item {index}: expected str instance, {} found",
                item.type_name()
            )));
        };
        if index > 0 {
            out.push_str(s);
        }
        out.push_str(part);
        check_len(out.len(), limits)?;
    }
    Ok(Value::string(out))
}

fn replace(s: &str, mut args: CallArgs, limits: &ResourceLimits) -> EvalResult {
    let count = args.take(2, "count");
    args.no_extra_keywords("replace")?;
    args.positional_arity("replace", 2, 3)?;
    let old = str_arg(&args.arg(0), "replace")?;
    let new = str_arg(&args.arg(1), "replace")?;
    let count = match count {
        Some(c) => usize::try_from(index_arg(&c)?).ok(),
        None => None,
    };
    let matches = if old.is_empty() {
        s.chars().count() + 1
    } else {
        s.matches(&*old).count()
    };
    let replaced = count.map_or(matches, |c| c.min(matches));
    let estimate = s.len() + replaced * new.len();
    check_len(estimate.saturating_sub(replaced * old.len()), limits)?;
    Ok(Value::string(match count {
        None => s.replace(&*old, &new),
        Some(c) => s.replacen(&*old, &new, c),
    }))
}

fn encode(s: &str, mut args: CallArgs) -> EvalResult {
    let encoding = args.take(0, "encoding");
    args.take(1, "errors");
    args.no_extra_keywords("encode")?;
    let encoding = optional_str(encoding, "encode")?;
    match encoding.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("utf-8" | "utf8" | "utf_8") => Ok(Value::bytes(s.as_bytes())),
        Some("ascii") => match s.char_indices().find(|(_, c)| !c.is_ascii()) {
            Some((i, c)) => Err(exception(
                ExcType::UnicodeEncodeError,
                format!(
                    "'ascii' codec can't encode character '\\u{:04x}' in position {}: ordinal not in range(128)",
                    u32::from(c),
                    char_pos(s, i)
                ),
            )),
            None => Ok(Value::bytes(s.as_bytes())),
        },
        Some(other) => Err(exception(
            ExcType::LookupError,
            format!("unknown encoding: {other}"),
        )),
    }
}

pub(super) fn call(interp: &mut Interpreter<'_>, s: &Rc<str>, name: &str, mut args: CallArgs) -> EvalResult {
    let limits = interp.limits;
    if let Some(result) = predicate(s, name) {
        args.arity(name, 0, 0)?;
        return Ok(Value::Bool(result));
    }
    match name {
        "capitalize" => {
            args.arity(name, 0, 0)?;
            Ok(Value::string(capitalize(s)))
        }
        "casefold" | "lower" => {
            args.arity(name, 0, 0)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "upper" => {
            args.arity(name, 0, 0)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "swapcase" => {
            args.arity(name, 0, 0)?;
            Ok(Value::string(swapcase(s)))
        }
        "title" => {
            args.arity(name, 0, 0)?;
            Ok(Value::string(title(s)))
        }
        "center" => pad(s, args, name, &limits, |total, width| total / 2 + (total & width & 1)),
        "ljust" => pad(s, args, name, &limits, |_, _| 0),
        "rjust" => pad(s, args, name, &limits, |total, _| total),
        "zfill" => {
            args.arity(name, 1, 1)?;
            let width = usize::try_from(index_arg(&args.arg(0))?).unwrap_or(0);
            check_len(width, &limits)?;
            Ok(Value::string(zfill(s, width)))
        }
        "count" => {
            args.arity(name, 1, 3)?;
            let sub = str_arg(&args.arg(0), name)?;
            let (_, hay) = window(s, args.positional.get(1).cloned(), args.positional.get(2).cloned())?;
            let n = if sub.is_empty() {
                hay.chars().count() + 1
            } else {
                hay.matches(&*sub).count()
            };
            Ok(to_index(n))
        }
        "find" | "rfind" => Ok(match find(s, &args, name, name == "rfind")? {
            Some(i) => to_index(i),
            None => Value::Int(-1),
        }),
        "index" | "rindex" => find(s, &args, name, name == "rindex")?
            .map(to_index)
            .ok_or_else(|| value_error("substring not found")),
        "startswith" => affix_match(s, args, name, false),
        "endswith" => affix_match(s, args, name, true),
        "removeprefix" => {
            args.arity(name, 1, 1)?;
            let prefix = str_arg(&args.arg(0), name)?;
            Ok(Value::str(s.strip_prefix(&*prefix).unwrap_or(s)))
        }
        "removesuffix" => {
            args.arity(name, 1, 1)?;
            let suffix = str_arg(&args.arg(0), name)?;
            Ok(Value::str(s.strip_suffix(&*suffix).unwrap_or(s)))
        }
        "strip" | "lstrip" | "rstrip" => {
            args.arity(name, 0, 1)?;
            let strip = strip_chars(optional_str(args.get(0).cloned(), name)?);
            Ok(Value::str(match name {
                "strip" => s.trim_matches(|c| strip(c)),
                "lstrip" => s.trim_start_matches(|c| strip(c)),
                _ => s.trim_end_matches(|c| strip(c)),
            }))
        }
        "split" => split(s, args, name, false),
        "rsplit" => split(s, args, name, true),
        "splitlines" => {
            let keepends = args.take(0, "keepends").is_some_and(|k| k.is_truthy());
            args.no_extra_keywords(name)?;
            Ok(Value::list(splitlines(s, keepends)))
        }
        "partition" => partition(s, &args, name, false),
        "rpartition" => partition(s, &args, name, true),
        "join" => join(s, &args, &limits),
        "replace" => replace(s, args, &limits),
        "expandtabs" => {
            let tabsize = args.take(0, "tabsize").map_or(Ok(8), |t| index_arg(&t))?;
            args.no_extra_keywords(name)?;
            let tabsize = usize::try_from(tabsize).unwrap_or(0);
            Ok(Value::string(expandtabs(s, tabsize, &limits)?))
        }
        "encode" => encode(s, args),
        other => Err(attribute_error("str", other)),
    }
}
