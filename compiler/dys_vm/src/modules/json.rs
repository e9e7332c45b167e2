//! `json`: `dumps` restricted to small indents and the two standard
//! separator layouts, and `loads`.

use dys_eval::errors::{exception, type_error};
use dys_eval::{native, CallArgs, EvalResult, ExcType, Interpreter, ModuleBuilder, ModuleValue, Session, Value};

use crate::convert::{encode, json_to_value, sort_keys, value_to_json, EncodeOptions, Strictness};

const MAX_INDENT: usize = 4;

fn assertion(message: impl Into<String>) -> dys_eval::EvalError {
    exception(ExcType::AssertionError, message)
}

/// Indentation unit for `indent=`: a count of spaces or a literal string.
fn indent_unit(indent: &Value) -> EvalResult<Option<String>> {
    let too_wide = || assertion(format!("indent must be less than or equal 4, got: {}", indent.to_str()));
    match indent {
        Value::None => Ok(None),
        Value::Str(s) if s.chars().count() > MAX_INDENT => Err(too_wide()),
        Value::Str(s) => Ok(Some(s.to_string())),
        Value::Int(n) => {
            // Negative widths still break lines, without indenting.
            let width = usize::try_from(*n).unwrap_or(0);
            if width > MAX_INDENT {
                return Err(too_wide());
            }
            Ok(Some(" ".repeat(width)))
        }
        other => Err(type_error(format!(
            "indent must be None, an int or a str, not {}",
            other.type_name()
        ))),
    }
}

/// Only the compact pair `(',', ':')` may be passed explicitly.
fn compact_separators(separators: &Value) -> EvalResult<bool> {
    let items: Vec<Value> = match separators {
        Value::None => return Ok(false),
        Value::Tuple(items) => items.to_vec(),
        Value::List(items) => items.borrow().clone(),
        _ => Vec::new(),
    };
    match items.as_slice() {
        [Value::Str(item), Value::Str(key)] if &**item == "," && &**key == ":" => Ok(true),
        _ => Err(assertion("separators can only be (',', ': ')")),
    }
}

fn dumps(_interp: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("dumps", 1, 1)?;
    let obj = args.arg(0);
    let indent = args.take_keyword("indent").unwrap_or(Value::None);
    let sort = args.take_keyword("sort_keys").is_some_and(|v| v.is_truthy());
    let separators = args.take_keyword("separators").unwrap_or(Value::None);
    let ensure_ascii = args.take_keyword("ensure_ascii").map_or(true, |v| v.is_truthy());
    if let Some(check) = args.take_keyword("check_circular") {
        if check.is_truthy() && !matches!(check, Value::Bool(true)) {
            return Err(assertion("check_circular must be True"));
        }
    }
    args.no_extra_keywords("dumps")?;

    let options = EncodeOptions {
        indent: indent_unit(&indent)?,
        compact: compact_separators(&separators)?,
        ensure_ascii,
    };
    let mut json = value_to_json(&obj, Strictness::Strict)?;
    if sort {
        json = sort_keys(&json);
    }
    Ok(Value::string(encode(&json, &options)?))
}

fn loads(_interp: &mut Interpreter<'_>, args: CallArgs) -> EvalResult {
    args.arity("loads", 1, 1)?;
    let text = match args.arg(0) {
        Value::Str(s) => s.to_string(),
        Value::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        other => {
            return Err(type_error(format!(
                "the JSON object must be str, bytes or bytearray, not {}",
                other.type_name()
            )))
        }
    };
    let json = serde_json::from_str(&text)
        .map_err(|err| exception(ExcType::JsonDecodeError, err.to_string()))?;
    json_to_value(&json)
}

pub fn module(session: &Session) -> ModuleValue {
    ModuleBuilder::new("json", Some("JSON encoder and decoder."))
        .function(
            "dumps",
            Some("Serialize obj to a JSON formatted str."),
            native(dumps),
        )
        .function(
            "loads",
            Some("Deserialize s (a str or bytes instance containing a JSON document) to a Python object."),
            native(loads),
        )
        .constant("JSONDecodeError", Value::ExceptionType(ExcType::JsonDecodeError))
        .build(session.interner())
}
