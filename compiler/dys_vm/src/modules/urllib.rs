//! `urllib.parse`: quoting, query strings and URL splitting.
//!
//! `urlsplit` returns an object with `scheme`, `netloc`, `path`, `query`,
//! `fragment`, `username`, `password`, `hostname`, `port` and `geturl()`;
//! it is not a tuple. `urldefrag` returns a plain `(url, fragment)` tuple.

use std::rc::Rc;

use percent_encoding::{percent_decode, percent_encode_byte};

use dys_eval::errors::{type_error, value_error};
use dys_eval::{
    iter, native, CallArgs, Dict, EvalResult, Interpreter, ModuleBuilder, ModuleValue, Session, Value,
};

/// Never quoted, whatever `safe` says, besides ASCII letters and digits.
const ALWAYS_SAFE: &[u8] = b"_.-~";

const SCHEME_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-.";

const USES_NETLOC: &[&str] = &[
    "", "ftp", "http", "gopher", "nntp", "telnet", "imap", "wais", "file", "mms", "https", "shttp",
    "snews", "prospero", "rtsp", "rtsps", "rtspu", "rsync", "svn", "svn+ssh", "sftp", "nfs", "git",
    "git+ssh", "ws", "wss",
];

const USES_RELATIVE: &[&str] = &[
    "", "ftp", "http", "gopher", "nntp", "imap", "wais", "file", "https", "shttp", "mms",
    "prospero", "rtsp", "rtsps", "rtspu", "sftp", "svn", "svn+ssh", "ws", "wss",
];

fn text(value: &Value, func: &str) -> EvalResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        other => Err(type_error(format!(
            "{func}() argument must be str or bytes, not {}",
            other.type_name()
        ))),
    }
}

/// Bytes to quote: `str` goes through UTF-8.
fn raw_bytes(value: &Value, func: &str) -> EvalResult<Vec<u8>> {
    match value {
        Value::Str(s) => Ok(s.as_bytes().to_vec()),
        Value::Bytes(b) => Ok(b.to_vec()),
        other => Err(type_error(format!(
            "{func}() argument must be str or bytes, not {}",
            other.type_name()
        ))),
    }
}

fn quote_bytes(bytes: &[u8], safe: &str) -> String {
    let mut quoted = String::with_capacity(bytes.len());
    for &byte in bytes {
        let kept = byte.is_ascii_alphanumeric()
            || ALWAYS_SAFE.contains(&byte)
            || (byte.is_ascii() && safe.as_bytes().contains(&byte));
        if kept {
            quoted.push(char::from(byte));
        } else {
            quoted.push_str(percent_encode_byte(byte));
        }
    }
    quoted
}

fn quote_plus_bytes(bytes: &[u8], safe: &str) -> String {
    if !bytes.contains(&b' ') {
        return quote_bytes(bytes, safe);
    }
    quote_bytes(bytes, &format!("{safe} ")).replace(' ', "+")
}

fn unquote_text(s: &str) -> String {
    percent_decode(s.as_bytes()).decode_utf8_lossy().into_owned()
}

fn unquote_plus_text(s: &str) -> String {
    unquote_text(&s.replace('+', " "))
}

fn safe_arg(args: &mut CallArgs, default: &str) -> EvalResult<String> {
    match args.take(1, "safe") {
        None => Ok(default.to_string()),
        Some(value) => text(&value, "quote"),
    }
}

fn quote(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let safe = safe_arg(&mut args, "/")?;
    args.take(2, "encoding");
    args.take(3, "errors");
    args.no_extra_keywords("quote")?;
    args.positional_arity("quote", 1, 4)?;
    Ok(Value::string(quote_bytes(&raw_bytes(&args.arg(0), "quote")?, &safe)))
}

fn quote_plus(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let safe = safe_arg(&mut args, "")?;
    args.take(2, "encoding");
    args.take(3, "errors");
    args.no_extra_keywords("quote_plus")?;
    args.positional_arity("quote_plus", 1, 4)?;
    Ok(Value::string(quote_plus_bytes(&raw_bytes(&args.arg(0), "quote_plus")?, &safe)))
}

fn quote_from_bytes(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let safe = safe_arg(&mut args, "/")?;
    args.no_extra_keywords("quote_from_bytes")?;
    args.positional_arity("quote_from_bytes", 1, 2)?;
    let Value::Bytes(bytes) = args.arg(0) else {
        return Err(type_error("quote_from_bytes() expected bytes"));
    };
    Ok(Value::string(quote_bytes(&bytes, &safe)))
}

fn unquote(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.take(1, "encoding");
    args.take(2, "errors");
    args.no_extra_keywords("unquote")?;
    args.positional_arity("unquote", 1, 3)?;
    Ok(Value::string(unquote_text(&text(&args.arg(0), "unquote")?)))
}

fn unquote_plus(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.take(1, "encoding");
    args.take(2, "errors");
    args.no_extra_keywords("unquote_plus")?;
    args.positional_arity("unquote_plus", 1, 3)?;
    Ok(Value::string(unquote_plus_text(&text(&args.arg(0), "unquote_plus")?)))
}

fn unquote_to_bytes(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("unquote_to_bytes", 1, 1)?;
    let source = raw_bytes(&args.arg(0), "unquote_to_bytes")?;
    let decoded: Vec<u8> = percent_decode(&source).collect();
    Ok(Value::bytes(&decoded))
}

/// Options shared by `parse_qs` and `parse_qsl`.
struct QueryOptions {
    keep_blank_values: bool,
    strict_parsing: bool,
    max_num_fields: Option<usize>,
    separator: String,
}

impl QueryOptions {
    fn take(args: &mut CallArgs, func: &str) -> EvalResult<Self> {
        let flag = |value: Option<Value>| value.is_some_and(|v| v.is_truthy());
        let keep_blank_values = flag(args.take(1, "keep_blank_values"));
        let strict_parsing = flag(args.take(2, "strict_parsing"));
        args.take(3, "encoding");
        args.take(4, "errors");
        let max_num_fields = match args.take(5, "max_num_fields") {
            None | Some(Value::None) => None,
            Some(Value::Int(n)) => Some(usize::try_from(n).unwrap_or(0)),
            Some(other) => {
                return Err(type_error(format!(
                    "max_num_fields must be an int, not {}",
                    other.type_name()
                )))
            }
        };
        let separator = match args.take(6, "separator") {
            None => "&".to_string(),
            Some(Value::Str(s)) if !s.is_empty() => s.to_string(),
            Some(_) => return Err(value_error("Separator must be of type string or bytes.")),
        };
        args.no_extra_keywords(func)?;
        args.positional_arity(func, 1, 7)?;
        Ok(QueryOptions {
            keep_blank_values,
            strict_parsing,
            max_num_fields,
            separator,
        })
    }
}

fn parse_pairs(query: &str, options: &QueryOptions) -> EvalResult<Vec<(String, String)>> {
    if let Some(max) = options.max_num_fields {
        if query.matches(options.separator.as_str()).count() + 1 > max {
            return Err(value_error("Max number of fields exceeded"));
        }
    }
    let mut pairs = Vec::new();
    for field in query.split(options.separator.as_str()) {
        if field.is_empty() && !options.strict_parsing {
            continue;
        }
        let (name, value) = match field.split_once('=') {
            Some(pair) => pair,
            None if options.strict_parsing => {
                return Err(value_error(format!("bad query field: '{field}'")));
            }
            None if options.keep_blank_values => (field, ""),
            None => continue,
        };
        if !value.is_empty() || options.keep_blank_values {
            pairs.push((unquote_plus_text(name), unquote_plus_text(value)));
        }
    }
    Ok(pairs)
}

fn parse_qsl(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let options = QueryOptions::take(&mut args, "parse_qsl")?;
    let query = text(&args.arg(0), "parse_qsl")?;
    let pairs = parse_pairs(&query, &options)?
        .into_iter()
        .map(|(name, value)| Value::tuple(vec![Value::string(name), Value::string(value)]))
        .collect();
    Ok(Value::list(pairs))
}

fn parse_qs(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let options = QueryOptions::take(&mut args, "parse_qs")?;
    let query = text(&args.arg(0), "parse_qs")?;
    let mut grouped: Vec<(String, Vec<Value>)> = Vec::new();
    for (name, value) in parse_pairs(&query, &options)? {
        match grouped.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(Value::string(value)),
            None => grouped.push((name, vec![Value::string(value)])),
        }
    }
    let mut dict = Dict::new();
    for (name, values) in grouped {
        dict.insert_str(&name, Value::list(values));
    }
    Ok(Value::dict(dict))
}

/// `urlencode(query, doseq=False, safe='')` with `quote_plus` quoting.
fn urlencode(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let doseq = args.take(1, "doseq").is_some_and(|v| v.is_truthy());
    let safe = match args.take(2, "safe") {
        None => String::new(),
        Some(value) => text(&value, "urlencode")?,
    };
    args.take(3, "encoding");
    args.take(4, "errors");
    args.no_extra_keywords("urlencode")?;
    args.positional_arity("urlencode", 1, 5)?;
    let pairs: Vec<(Value, Value)> = match args.arg(0) {
        Value::Dict(dict) => dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        other => {
            let mut pairs = Vec::new();
            for item in iter::collect(&other, interp.limits())? {
                let Value::Tuple(pair) = item else {
                    return Err(type_error("not a valid non-string sequence or mapping object"));
                };
                let [key, value] = &pair[..] else {
                    return Err(type_error("not a valid non-string sequence or mapping object"));
                };
                pairs.push((key.clone(), value.clone()));
            }
            pairs
        }
    };
    let encode = |value: &Value| match value {
        Value::Bytes(b) => quote_plus_bytes(b, &safe),
        Value::Str(s) => quote_plus_bytes(s.as_bytes(), &safe),
        other => quote_plus_bytes(other.to_str().as_bytes(), &safe),
    };
    let mut fields = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        let key = encode(&key);
        match &value {
            Value::List(_) | Value::Tuple(_) if doseq => {
                for item in iter::collect(&value, interp.limits())? {
                    fields.push(format!("{key}={}", encode(&item)));
                }
            }
            _ => fields.push(format!("{key}={}", encode(&value))),
        }
    }
    Ok(Value::string(fields.join("&")))
}

/// The five parts of a URL, as `urlsplit` finds them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct SplitUrl {
    scheme: String,
    netloc: String,
    path: String,
    query: String,
    fragment: String,
}

impl SplitUrl {
    fn split(url: &str, default_scheme: &str, allow_fragments: bool) -> EvalResult<Self> {
        let cleaned: String = url
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();
        let mut rest = cleaned.as_str();
        let mut parts = SplitUrl {
            scheme: default_scheme.to_string(),
            ..SplitUrl::default()
        };
        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            let starts_alpha = candidate.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
            if colon > 0 && starts_alpha && candidate.chars().all(|c| SCHEME_CHARS.contains(c)) {
                parts.scheme = candidate.to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            parts.netloc = after[..end].to_string();
            rest = &after[end..];
            let opens = parts.netloc.contains('[');
            let closes = parts.netloc.contains(']');
            if opens != closes {
                return Err(value_error("Invalid IPv6 URL"));
            }
        }
        if allow_fragments {
            if let Some((before, fragment)) = rest.split_once('#') {
                parts.fragment = fragment.to_string();
                rest = before;
            }
        }
        if let Some((before, query)) = rest.split_once('?') {
            parts.query = query.to_string();
            rest = before;
        }
        parts.path = rest.to_string();
        Ok(parts)
    }

    fn unsplit(&self) -> String {
        let mut url = self.path.clone();
        let wants_netloc = !self.scheme.is_empty() && USES_NETLOC.contains(&self.scheme.as_str());
        if !self.netloc.is_empty() {
            if !url.is_empty() && !url.starts_with('/') {
                url.insert(0, '/');
            }
            url = format!("//{}{url}", self.netloc);
        } else if url.starts_with("//") || (wants_netloc && (url.is_empty() || url.starts_with('/'))) {
            url = format!("//{url}");
        }
        if !self.scheme.is_empty() {
            url = format!("{}:{url}", self.scheme);
        }
        if !self.query.is_empty() {
            url = format!("{url}?{}", self.query);
        }
        if !self.fragment.is_empty() {
            url = format!("{url}#{}", self.fragment);
        }
        url
    }

    fn userinfo(&self) -> Option<&str> {
        self.netloc.rsplit_once('@').map(|(info, _)| info)
    }

    fn hostport(&self) -> &str {
        self.netloc.rsplit_once('@').map_or(self.netloc.as_str(), |(_, host)| host)
    }

    fn username(&self) -> Option<String> {
        self.userinfo()
            .map(|info| info.split_once(':').map_or(info, |(user, _)| user).to_string())
    }

    fn password(&self) -> Option<String> {
        self.userinfo()
            .and_then(|info| info.split_once(':'))
            .map(|(_, password)| password.to_string())
    }

    fn hostname(&self) -> Option<String> {
        let hostport = self.hostport();
        let host = if let Some(bracketed) = hostport.strip_prefix('[') {
            bracketed.split(']').next().unwrap_or_default()
        } else {
            hostport.split(':').next().unwrap_or_default()
        };
        (!host.is_empty()).then(|| host.to_ascii_lowercase())
    }

    fn port(&self) -> EvalResult<Option<i64>> {
        let hostport = self.hostport();
        let after_host = match hostport.rfind(']') {
            Some(close) => &hostport[close + 1..],
            None => hostport,
        };
        let Some((_, port)) = after_host.split_once(':') else {
            return Ok(None);
        };
        if port.is_empty() {
            return Ok(None);
        }
        match port.parse::<i64>() {
            Ok(n) if (0..=65535).contains(&n) && port.bytes().all(|b| b.is_ascii_digit()) => Ok(Some(n)),
            Ok(_) => Err(value_error("Port out of range 0-65535")),
            Err(_) => Err(value_error(format!("Port could not be cast to integer value as '{port}'"))),
        }
    }

    /// `SplitResult(...)` as a native object.
    fn into_value(self, interp: &Interpreter<'_>) -> EvalResult {
        let repr = format!(
            "SplitResult(scheme='{}', netloc='{}', path='{}', query='{}', fragment='{}')",
            self.scheme, self.netloc, self.path, self.query, self.fragment
        );
        let optional = |value: Option<String>| value.map_or(Value::None, Value::string);
        let port = self.port();
        let url = self.unsplit();
        let object = ModuleBuilder::object("urllib.parse.SplitResult", repr.as_str(), repr.as_str())
            .constant("scheme", Value::str(&self.scheme))
            .constant("netloc", Value::str(&self.netloc))
            .constant("path", Value::str(&self.path))
            .constant("query", Value::str(&self.query))
            .constant("fragment", Value::str(&self.fragment))
            .constant("username", optional(self.username()))
            .constant("password", optional(self.password()))
            .constant("hostname", optional(self.hostname()))
            .constant("port", port?.map_or(Value::None, Value::Int))
            .function(
                "geturl",
                Some("Return the re-combined version of the original URL."),
                native(move |_, args| {
                    args.arity("geturl", 0, 0)?;
                    Ok(Value::str(&url))
                }),
            )
            .build(interp.session().interner());
        Ok(interp.session().adopt(object))
    }
}

fn urlsplit(interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let scheme = match args.take(1, "scheme") {
        None => String::new(),
        Some(value) => text(&value, "urlsplit")?,
    };
    let allow_fragments = args.take(2, "allow_fragments").map_or(true, |v| v.is_truthy());
    args.no_extra_keywords("urlsplit")?;
    args.positional_arity("urlsplit", 1, 3)?;
    let url = text(&args.arg(0), "urlsplit")?;
    SplitUrl::split(&url, &scheme, allow_fragments)?.into_value(interp)
}

/// A five-part URL given as a sequence or a `SplitResult` object.
fn parts_arg(interp: &Interpreter<'_>, value: &Value) -> EvalResult<SplitUrl> {
    let field = |name: &str| -> EvalResult<String> {
        let Value::Module(object) = value else {
            return Ok(String::new());
        };
        let member = interp
            .session()
            .interner()
            .get(name)
            .and_then(|key| object.members.get(&key).cloned());
        match member {
            Some(member) => text(&member, "urlunsplit"),
            None => Err(type_error("urlunsplit() expects a SplitResult")),
        }
    };
    if let Value::Module(_) = value {
        return Ok(SplitUrl {
            scheme: field("scheme")?,
            netloc: field("netloc")?,
            path: field("path")?,
            query: field("query")?,
            fragment: field("fragment")?,
        });
    }
    let items = iter::collect(value, interp.limits())?;
    let [scheme, netloc, path, query, fragment] = &items[..] else {
        return Err(value_error(format!(
            "not enough values to unpack (expected 5, got {})",
            items.len()
        )));
    };
    Ok(SplitUrl {
        scheme: text(scheme, "urlunsplit")?,
        netloc: text(netloc, "urlunsplit")?,
        path: text(path, "urlunsplit")?,
        query: text(query, "urlunsplit")?,
        fragment: text(fragment, "urlunsplit")?,
    })
}

fn urlunsplit(interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("urlunsplit", 1, 1)?;
    Ok(Value::string(parts_arg(interp, &args.arg(0))?.unsplit()))
}

/// Resolve `url` against `base` the way a browser follows a link.
fn join(base: &str, url: &str, allow_fragments: bool) -> EvalResult<String> {
    if base.is_empty() {
        return Ok(url.to_string());
    }
    if url.is_empty() {
        return Ok(base.to_string());
    }
    let base = SplitUrl::split(base, "", allow_fragments)?;
    let mut target = SplitUrl::split(url, &base.scheme, allow_fragments)?;
    if target.scheme != base.scheme || !USES_RELATIVE.contains(&target.scheme.as_str()) {
        return Ok(url.to_string());
    }
    if USES_NETLOC.contains(&target.scheme.as_str()) {
        if !target.netloc.is_empty() {
            return Ok(target.unsplit());
        }
        target.netloc.clone_from(&base.netloc);
    }
    if target.path.is_empty() {
        target.path.clone_from(&base.path);
        if target.query.is_empty() {
            target.query.clone_from(&base.query);
        }
        return Ok(target.unsplit());
    }

    let mut base_parts: Vec<&str> = base.path.split('/').collect();
    if base_parts.last().is_some_and(|last| !last.is_empty()) {
        base_parts.pop();
    }
    let segments: Vec<&str> = if target.path.starts_with('/') {
        target.path.split('/').collect()
    } else {
        let mut joined = base_parts;
        joined.extend(target.path.split('/'));
        let last = joined.len().saturating_sub(1);
        joined
            .iter()
            .enumerate()
            .filter(|&(i, segment)| i == 0 || i == last || !segment.is_empty())
            .map(|(_, segment)| *segment)
            .collect()
    };
    let mut resolved: Vec<&str> = Vec::new();
    for segment in &segments {
        match *segment {
            ".." => {
                resolved.pop();
            }
            "." => {}
            other => resolved.push(other),
        }
    }
    if matches!(segments.last(), Some(&"." | &"..")) {
        resolved.push("");
    }
    let path = resolved.join("/");
    target.path = if path.is_empty() { "/".to_string() } else { path };
    Ok(target.unsplit())
}

fn urljoin(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    let allow_fragments = args.take(2, "allow_fragments").map_or(true, |v| v.is_truthy());
    args.no_extra_keywords("urljoin")?;
    args.positional_arity("urljoin", 2, 3)?;
    let base = text(&args.arg(0), "urljoin")?;
    let url = text(&args.arg(1), "urljoin")?;
    Ok(Value::string(join(&base, &url, allow_fragments)?))
}

fn urldefrag(_: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("urldefrag", 1, 1)?;
    let url = text(&args.arg(0), "urldefrag")?;
    let (bare, fragment) = url.split_once('#').unwrap_or((&url, ""));
    Ok(Value::tuple(vec![Value::str(bare), Value::str(fragment)]))
}

fn parse_module(session: &Session) -> ModuleValue {
    ModuleBuilder::new("urllib.parse", Some("Parse (absolute and relative) URLs."))
        .function("parse_qs", Some("Parse a query given as a string argument."), native(parse_qs))
        .function("parse_qsl", Some("Parse a query given as a string argument into a list of pairs."), native(parse_qsl))
        .function("urlencode", Some("Encode a dict or sequence of two-element tuples into a URL query string."), native(urlencode))
        .function("urlsplit", Some("Parse a URL into 5 components."), native(urlsplit))
        .function("urlunsplit", Some("Combine the elements of a tuple as returned by urlsplit() into a complete URL."), native(urlunsplit))
        .function("urljoin", Some("Join a base URL and a possibly relative URL to form an absolute interpretation of the latter."), native(urljoin))
        .function("urldefrag", Some("Removes any existing fragment from URL."), native(urldefrag))
        .function("quote", Some("Quote special characters in a string using the %xx escape."), native(quote))
        .function("quote_plus", Some("Like quote(), but also replace spaces with plus signs."), native(quote_plus))
        .function("quote_from_bytes", Some("Like quote(), but accepts a bytes object."), native(quote_from_bytes))
        .function("unquote", Some("Replace %xx escapes by their single-character equivalent."), native(unquote))
        .function("unquote_plus", Some("Like unquote(), but also replace plus signs by spaces."), native(unquote_plus))
        .function("unquote_to_bytes", Some("Replace %xx escapes by their single-byte equivalent."), native(unquote_to_bytes))
        .build(session.interner())
}

pub fn module(session: &Session) -> ModuleValue {
    ModuleBuilder::new("urllib", None)
        .constant("parse", Value::Module(Rc::new(parse_module(session))))
        .build(session.interner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(keep_blank_values: bool) -> QueryOptions {
        QueryOptions {
            keep_blank_values,
            strict_parsing: false,
            max_num_fields: None,
            separator: "&".to_string(),
        }
    }

    fn pairs(query: &str, keep_blank_values: bool) -> Vec<(String, String)> {
        parse_pairs(query, &options(keep_blank_values)).unwrap_or_default()
    }

    #[test]
    fn quoting_keeps_safe_characters() {
        assert_eq!(quote_bytes(b"/a b/~c", "/"), "/a%20b/~c");
        assert_eq!(quote_bytes("é&".as_bytes(), ""), "%C3%A9%26");
        assert_eq!(quote_plus_bytes(b"a b&c", ""), "a+b%26c");
        assert_eq!(unquote_text("%C3%A9%2"), "é%2");
    }

    #[test]
    fn query_strings_drop_blank_values_by_default() {
        let owned = |items: &[(&str, &str)]| -> Vec<(String, String)> {
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        assert_eq!(pairs("a=1&b=&c&a=x+y%21", false), owned(&[("a", "1"), ("a", "x y!")]));
        assert_eq!(
            pairs("a=1&b=&c", true),
            owned(&[("a", "1"), ("b", ""), ("c", "")])
        );
    }

    #[test]
    fn urls_split_into_five_parts() {
        let parts = SplitUrl::split("HTTPS://user:pw@Example.com:8080/p/a?q=1#frag", "", true).unwrap_or_default();
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.netloc, "user:pw@Example.com:8080");
        assert_eq!(parts.path, "/p/a");
        assert_eq!(parts.query, "q=1");
        assert_eq!(parts.fragment, "frag");
        assert_eq!(parts.hostname().as_deref(), Some("example.com"));
        assert_eq!(parts.username().as_deref(), Some("user"));
        assert_eq!(parts.port().ok().flatten(), Some(8080));
        assert_eq!(parts.unsplit(), "https://user:pw@Example.com:8080/p/a?q=1#frag");
    }

    #[test]
    fn relative_references_resolve_against_the_base() {
        let base = "http://a/b/c/d;p?q";
        for (url, expected) in [
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("..", "http://a/b/"),
            ("../../g", "http://a/g"),
            ("https://x/y", "https://x/y"),
        ] {
            assert_eq!(join(base, url, true).ok().as_deref(), Some(expected), "{url}");
        }
    }
}
