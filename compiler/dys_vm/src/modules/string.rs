//! `string`: character-class constants and `capwords`.

use dys_eval::errors::{type_error, value_error};
use dys_eval::{native, CallArgs, EvalResult, Interpreter, ModuleBuilder, ModuleValue, Session, Value};

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;
const WHITESPACE: &str = " \t\n\r\x0b\x0c";

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `capwords(s, sep=None)`: split, capitalize each word, join.
fn capwords(_: &mut Interpreter<'_>, mut args: CallArgs) -> EvalResult {
    args.positional_arity("capwords", 1, 2)?;
    let sep = args.take(1, "sep");
    args.no_extra_keywords("capwords")?;
    let Value::Str(s) = args.arg(0) else {
        return Err(type_error("capwords() argument must be str"));
    };
    let words: Vec<String> = match sep {
        None | Some(Value::None) => s.split_whitespace().map(capitalize).collect(),
        Some(Value::Str(sep)) if !sep.is_empty() => {
            return Ok(Value::string(
                s.split(&*sep).map(capitalize).collect::<Vec<_>>().join(&*sep),
            ));
        }
        Some(Value::Str(_)) => return Err(value_error("empty separator")),
        Some(other) => {
            return Err(type_error(format!(
                "must be str or None, not {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::string(words.join(" ")))
}

pub fn module(session: &Session) -> ModuleValue {
    let letters = format!("{LOWERCASE}{UPPERCASE}");
    let printable = format!("{DIGITS}{letters}{PUNCTUATION}{WHITESPACE}");
    ModuleBuilder::new("string", Some("A collection of string constants."))
        .function(
            "capwords",
            Some("Split the argument into words using split, capitalize each word using capitalize, and join the capitalized words using join."),
            native(capwords),
        )
        .constant("ascii_letters", Value::string(letters))
        .constant("ascii_lowercase", Value::str(LOWERCASE))
        .constant("ascii_uppercase", Value::str(UPPERCASE))
        .constant("digits", Value::str(DIGITS))
        .constant("hexdigits", Value::str("0123456789abcdefABCDEF"))
        .constant("octdigits", Value::str("01234567"))
        .constant("punctuation", Value::str(PUNCTUATION))
        .constant("printable", Value::string(printable))
        .constant("whitespace", Value::str(WHITESPACE))
        .build(session.interner())
}
