//! Conversions between script values and JSON.
//!
//! Host replies, invocation arguments and `json.loads` go JSON to value.
//! The other direction has two modes: [`Strictness::Strict`] for
//! `json.dumps` and host parameters, which rejects values JSON cannot
//! carry, and [`Strictness::Lenient`] for invocation results, which writes
//! their `repr` instead.

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, Formatter};
use serde_json::{Map, Number, Value as Json};

use dys_eval::errors::{exception, type_error, value_error};
use dys_eval::value::format_float;
use dys_eval::{Dict, EvalError, ExcType, Value};

/// Nesting deeper than this is treated as a reference cycle.
const MAX_DEPTH: usize = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// Integers must fit an `int`; a wider one is an `OverflowError`, never a
/// silently rounded float.
pub fn json_to_value(json: &Json) -> Result<Value, EvalError> {
    Ok(match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) if n.is_f64() => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => {
                return Err(exception(
                    ExcType::OverflowError,
                    format!("int too large to convert: {n}"),
                ))
            }
        },
        Json::String(s) => Value::str(s),
        Json::Array(items) => Value::list(items.iter().map(json_to_value).collect::<Result<_, _>>()?),
        Json::Object(map) => {
            let mut dict = Dict::new();
            for (key, value) in map {
                dict.insert_str(key, json_to_value(value)?);
            }
            Value::dict(dict)
        }
    })
}

pub fn value_to_json(value: &Value, strictness: Strictness) -> Result<Json, EvalError> {
    to_json(value, strictness, 0)
}

fn float_to_json(f: f64) -> Json {
    Number::from_f64(f).map_or(Json::Null, Json::Number)
}

fn to_json(value: &Value, strictness: Strictness, depth: usize) -> Result<Json, EvalError> {
    if depth > MAX_DEPTH {
        return Err(value_error("Circular reference detected"));
    }
    let seq = |items: &[Value]| -> Result<Json, EvalError> {
        items
            .iter()
            .map(|item| to_json(item, strictness, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array)
    };
    Ok(match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => float_to_json(*f),
        Value::Str(s) => Json::String(s.to_string()),
        Value::List(items) => seq(&items.borrow())?,
        Value::Tuple(items) => seq(items)?,
        Value::Dict(dict) => {
            let mut map = Map::new();
            for (key, item) in dict.borrow().iter() {
                map.insert(object_key(key)?, to_json(item, strictness, depth + 1)?);
            }
            Json::Object(map)
        }
        other => match strictness {
            Strictness::Lenient => Json::String(other.repr()),
            Strictness::Strict => {
                return Err(type_error(format!(
                    "Object of type {} is not JSON serializable",
                    other.type_name()
                )))
            }
        },
    })
}

/// JSON object keys follow the reference encoder: scalars are stringified.
fn object_key(key: &Value) -> Result<String, EvalError> {
    Ok(match key {
        Value::Str(s) => s.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::None => "null".to_string(),
        other => {
            return Err(type_error(format!(
                "keys must be str, int, float, bool or None, not {}",
                other.type_name()
            )))
        }
    })
}

/// A copy of `json` with every object's keys in sorted order.
pub fn sort_keys(json: &Json) -> Json {
    match json {
        Json::Array(items) => Json::Array(items.iter().map(sort_keys).collect()),
        Json::Object(map) => {
            let mut entries: Vec<(&String, &Json)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Json::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

/// Layout options of [`encode`].
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// Indentation unit; `None` writes everything on one line.
    pub indent: Option<String>,
    /// Use `,` and `:` without spaces.
    pub compact: bool,
    /// Escape every non-ASCII character.
    pub ensure_ascii: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            indent: None,
            compact: false,
            ensure_ascii: true,
        }
    }
}

/// Writes JSON the way the reference `json.dumps` lays it out.
struct ReferenceFormatter<'o> {
    options: &'o EncodeOptions,
    level: usize,
    has_value: bool,
}

impl ReferenceFormatter<'_> {
    fn item_separator(&self) -> &'static [u8] {
        if self.options.compact || self.options.indent.is_some() {
            b","
        } else {
            b", "
        }
    }

    fn newline<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(unit) = &self.options.indent {
            writer.write_all(b"\n")?;
            for _ in 0..self.level {
                writer.write_all(unit.as_bytes())?;
            }
        }
        Ok(())
    }

    fn open<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.level += 1;
        self.has_value = false;
        writer.write_all(bracket)
    }

    fn close<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.level -= 1;
        if self.has_value {
            self.newline(writer)?;
        }
        writer.write_all(bracket)
    }

    fn item<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if !first {
            writer.write_all(self.item_separator())?;
        }
        self.newline(writer)
    }
}

impl Formatter for ReferenceFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.item(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.item(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let separator: &[u8] = if self.options.compact { b":" } else { b": " };
        writer.write_all(separator)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_float(value).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if !self.options.ensure_ascii {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() && c != '\x7f' {
                let mut byte = [0u8; 1];
                writer.write_all(c.encode_utf8(&mut byte).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }

    fn write_char_escape<W: ?Sized + io::Write>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()> {
        let escaped: &[u8] = match char_escape {
            CharEscape::Quote => b"\\\"",
            CharEscape::ReverseSolidus => b"\\\\",
            CharEscape::Solidus => b"\\/",
            CharEscape::Backspace => b"\\b",
            CharEscape::FormFeed => b"\\f",
            CharEscape::LineFeed => b"\\n",
            CharEscape::CarriageReturn => b"\\r",
            CharEscape::Tab => b"\\t",
            CharEscape::AsciiControl(byte) => {
                return write!(writer, "\\u{:04x}", byte);
            }
        };
        writer.write_all(escaped)
    }
}

/// Serialize `json` with the reference encoder's layout.
pub fn encode(json: &Json, options: &EncodeOptions) -> Result<String, EvalError> {
    let mut out = Vec::new();
    let formatter = ReferenceFormatter {
        options,
        level: 0,
        has_value: false,
    };
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    json.serialize(&mut serializer)
        .map_err(|err| value_error(err.to_string()))?;
    String::from_utf8(out).map_err(|err| value_error(err.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dumps(json: &Json, options: &EncodeOptions) -> String {
        encode(json, options).unwrap()
    }

    #[test]
    fn default_layout_matches_the_reference_encoder() {
        let doc = json!({ "a": [1, 2.5, null], "b": "x" });
        assert_eq!(
            dumps(&doc, &EncodeOptions::default()),
            r#"{"a": [1, 2.5, null], "b": "x"}"#
        );
    }

    #[test]
    fn compact_layout_drops_spaces() {
        let doc = json!({ "a": [1, true] });
        let options = EncodeOptions { compact: true, ..EncodeOptions::default() };
        assert_eq!(dumps(&doc, &options), r#"{"a":[1,true]}"#);
    }

    #[test]
    fn indented_layout_nests() {
        let doc = json!({ "a": [1], "b": {} });
        let options = EncodeOptions { indent: Some("  ".into()), ..EncodeOptions::default() };
        assert_eq!(dumps(&doc, &options), "{\n  \"a\": [\n    1\n  ],\n  \"b\": {}\n}");
    }

    #[test]
    fn non_ascii_is_escaped_unless_disabled() {
        let doc = json!("é😀");
        assert_eq!(dumps(&doc, &EncodeOptions::default()), r#""\u00e9\ud83d\ude00""#);
        let raw = EncodeOptions { ensure_ascii: false, ..EncodeOptions::default() };
        assert_eq!(dumps(&doc, &raw), "\"é😀\"");
    }

    #[test]
    fn floats_use_the_reference_repr() {
        assert_eq!(dumps(&json!(1e20), &EncodeOptions::default()), "1e+20");
        assert_eq!(dumps(&json!(1.0), &EncodeOptions::default()), "1.0");
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let mut dict = Dict::new();
        dict.insert(Value::Int(1), Value::None).unwrap();
        dict.insert(Value::Float(2.5), Value::Int(2)).unwrap();
        dict.insert(Value::None, Value::Int(3)).unwrap();
        dict.insert(Value::Bool(false), Value::Int(4)).unwrap();
        let json = value_to_json(&Value::dict(dict), Strictness::Strict).unwrap();
        assert_eq!(json, json!({ "1": null, "2.5": 2, "null": 3, "false": 4 }));
    }

    #[test]
    fn strict_mode_rejects_sets() {
        let set = Value::set(dys_eval::ValueSet::new());
        let err = value_to_json(&set, Strictness::Strict).unwrap_err();
        assert_eq!(err.message(), "Object of type set is not JSON serializable");
        assert_eq!(value_to_json(&set, Strictness::Lenient).unwrap(), json!("set()"));
    }

    #[test]
    fn self_containing_lists_are_detected() {
        let list = Value::list(Vec::new());
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        let err = value_to_json(&list, Strictness::Strict).unwrap_err();
        assert_eq!(err.message(), "Circular reference detected");
        if let Value::List(items) = &list {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn objects_become_dicts_in_order() {
        let value = json_to_value(&json!({ "z": 1, "a": [true, "s"] })).unwrap();
        assert_eq!(value.repr(), "{'z': 1, 'a': [True, 's']}");
    }

    #[test]
    fn integers_wider_than_int_overflow() {
        let err = json_to_value(&json!([1, u64::MAX])).unwrap_err();
        assert_eq!(err.message(), "int too large to convert: 18446744073709551615");
        assert_eq!(json_to_value(&json!(i64::MIN)).unwrap().repr(), "-9223372036854775808");
        assert_eq!(json_to_value(&json!(2.0)).unwrap().repr(), "2.0");
    }

    #[test]
    fn sorting_is_recursive() {
        let sorted = sort_keys(&json!({ "b": { "d": 1, "c": 2 }, "a": 0 }));
        assert_eq!(sorted.to_string(), r#"{"a":0,"b":{"c":2,"d":1}}"#);
    }
}
