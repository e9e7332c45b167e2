//! `bytes` methods.

use std::fmt::Write;
use std::rc::Rc;

use crate::builtins::convert::decode_utf8;
use crate::errors::{attribute_error, exception, EvalResult};
use crate::native::CallArgs;
use crate::value::{ExcType, Value};

pub(super) fn call(bytes: &Rc<[u8]>, name: &str, mut args: CallArgs) -> EvalResult {
    match name {
        "decode" => {
            let encoding = args.take(0, "encoding");
            args.take(1, "errors");
            args.no_extra_keywords(name)?;
            let encoding = encoding
                .as_ref()
                .and_then(Value::as_str)
                .map_or_else(|| "utf-8".to_string(), str::to_ascii_lowercase);
            match encoding.as_str() {
                "utf-8" | "utf8" | "utf_8" => decode_utf8(bytes),
                "ascii" => match bytes.iter().position(|b| !b.is_ascii()) {
                    Some(i) => Err(exception(
                        ExcType::UnicodeDecodeError,
                        format!(
                            "'ascii' codec can't decode byte 0x{:02x} in position {i}: ordinal not in range(128)",
                            bytes[i]
                        ),
                    )),
                    None => decode_utf8(bytes),
                },
                other => Err(exception(
                    ExcType::LookupError,
                    format!("unknown encoding: {other}"),
                )),
            }
        }
        "hex" => {
            args.arity(name, 0, 0)?;
            let mut out = String::with_capacity(bytes.len() * 2);
            for b in bytes.iter() {
                let _ = write!(out, "{b:02x}");
            }
            Ok(Value::string(out))
        }
        other => Err(attribute_error("bytes", other)),
    }
}
