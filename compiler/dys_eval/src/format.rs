//! The format-spec mini-language used by f-string fields.
//!
//! `[[fill]align][sign][#][0][width][,|_][.precision][type]`, with the
//! width and precision bounded so a field cannot allocate unbounded text.

use crate::accounting::ResourceLimits;
use crate::errors::{resource, value_error, EvalError, ResourceKind};
use crate::value::{format_float, Value};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Spec {
    fill: Option<char>,
    align: Option<Align>,
    sign: Option<char>,
    alternate: bool,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    ty: Option<char>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

fn invalid() -> EvalError {
    value_error("Invalid format specifier")
}

fn parse_number(chars: &[char], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    // Long digit runs saturate and then fail the width check.
    Some(
        chars[start..*pos]
            .iter()
            .fold(0usize, |n, d| {
                n.saturating_mul(10)
                    .saturating_add(d.to_digit(10).map_or(0, |d| d as usize))
            }),
    )
}

fn parse_spec(spec: &str, limits: &ResourceLimits) -> Result<Spec, EvalError> {
    let chars: Vec<char> = spec.chars().collect();
    let mut parsed = Spec::default();
    let mut pos = 0;
    if chars.len() >= 2 && align_of(chars[1]).is_some() {
        parsed.fill = Some(chars[0]);
        parsed.align = align_of(chars[1]);
        pos = 2;
    } else if let Some(align) = chars.first().copied().and_then(align_of) {
        parsed.align = Some(align);
        pos = 1;
    }
    if let Some(&c @ ('+' | '-' | ' ')) = chars.get(pos) {
        parsed.sign = Some(c);
        pos += 1;
    }
    if chars.get(pos) == Some(&'#') {
        parsed.alternate = true;
        pos += 1;
    }
    if chars.get(pos) == Some(&'0') {
        parsed.zero = true;
        pos += 1;
    }
    parsed.width = parse_number(&chars, &mut pos).unwrap_or(0);
    if parsed.width > limits.max_format_width {
        return Err(resource(
            ResourceKind::FormatWidth,
            "Sorry, this format width is too long.",
        ));
    }
    if let Some(&c @ (',' | '_')) = chars.get(pos) {
        parsed.grouping = Some(c);
        pos += 1;
    }
    if chars.get(pos) == Some(&'.') {
        pos += 1;
        let precision = parse_number(&chars, &mut pos)
            .ok_or_else(|| value_error("Format specifier missing precision"))?;
        if precision > limits.max_format_width {
            return Err(resource(
                ResourceKind::FormatWidth,
                "Sorry, this format precision is too long.",
            ));
        }
        parsed.precision = Some(precision);
    }
    if let Some(&c) = chars.get(pos) {
        if !"sbcdoxXneEfFgG%".contains(c) {
            return Err(value_error(format!("Unknown format code '{c}'")));
        }
        parsed.ty = Some(c);
        pos += 1;
    }
    if pos != chars.len() {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Render `value` under `spec`.
pub fn format_value(value: &Value, spec: &str, limits: &ResourceLimits) -> Result<String, EvalError> {
    let spec = parse_spec(spec, limits)?;
    if spec.ty.is_none() && !matches!(value, Value::Int(_) | Value::Bool(_) | Value::Float(_)) {
        if spec.sign.is_some() || spec.grouping.is_some() {
            return Err(invalid());
        }
        let mut text = value.to_str();
        if let Some(precision) = spec.precision {
            text = text.chars().take(precision).collect();
        }
        return Ok(pad(&spec, "", &text, Align::Left));
    }
    let unknown = || {
        value_error(format!(
            "Unknown format code '{}' for object of type '{}'",
            spec.ty.unwrap_or(' '),
            value.type_name()
        ))
    };
    match spec.ty {
        Some('s') => match value {
            Value::Str(_) => {
                let text: String = match spec.precision {
                    Some(p) => value.to_str().chars().take(p).collect(),
                    None => value.to_str(),
                };
                Ok(pad(&spec, "", &text, Align::Left))
            }
            _ => Err(unknown()),
        },
        Some('d' | 'b' | 'o' | 'x' | 'X' | 'c' | 'n') | None if value.as_int().is_some() => {
            let i = value.as_int().unwrap_or(0);
            format_int(&spec, i)
        }
        Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%' | 'n') | None => match value.as_float() {
            Some(f) => Ok(format_float_spec(&spec, f)),
            None => Err(unknown()),
        },
        _ => Err(unknown()),
    }
}

fn sign_prefix(spec: &Spec, negative: bool) -> &'static str {
    match (negative, spec.sign) {
        (true, _) => "-",
        (false, Some('+')) => "+",
        (false, Some(' ')) => " ",
        _ => "",
    }
}

fn group(digits: &str, sep: char, every: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / every);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % every == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

fn format_int(spec: &Spec, i: i64) -> Result<String, EvalError> {
    if spec.precision.is_some() {
        return Err(value_error("Precision not allowed in integer format specifier"));
    }
    let magnitude = i.unsigned_abs();
    let (prefix, digits) = match spec.ty {
        Some('b') => ("0b", format!("{magnitude:b}")),
        Some('o') => ("0o", format!("{magnitude:o}")),
        Some('x') => ("0x", format!("{magnitude:x}")),
        Some('X') => ("0X", format!("{magnitude:X}")),
        Some('c') => {
            let c = u32::try_from(i)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| value_error("%c arg not in range(0x110000)"))?;
            return Ok(pad(spec, "", &c.to_string(), Align::Left));
        }
        _ => ("", magnitude.to_string()),
    };
    let digits = match spec.grouping {
        Some(sep) if matches!(spec.ty, Some('b' | 'o' | 'x' | 'X')) => group(&digits, sep, 4),
        Some(sep) => group(&digits, sep, 3),
        None => digits,
    };
    let mut head = sign_prefix(spec, i < 0).to_string();
    if spec.alternate {
        head.push_str(prefix);
    }
    Ok(pad(spec, &head, &digits, Align::Right))
}

/// Exponent notation with at least two exponent digits: `1.5e+00`.
fn exp_notation(f: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{f:.precision$e}");
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn strip_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn general(f: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let p = precision.max(1);
    if f == 0.0 {
        return if alternate {
            format!("{:.*}", p - 1, 0.0)
        } else {
            "0".to_string()
        };
    }
    let sci = exp_notation(f, p - 1, upper);
    let exp: i64 = sci
        .rsplit_once(if upper { 'E' } else { 'e' })
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let p_i = i64::try_from(p).unwrap_or(i64::MAX);
    if (-4..p_i).contains(&exp) {
        let decimals = usize::try_from(p_i - 1 - exp).unwrap_or(0);
        let fixed = format!("{f:.decimals$}");
        if alternate {
            fixed
        } else {
            strip_zeros(&fixed)
        }
    } else if alternate {
        sci
    } else {
        let (mantissa, exponent) = sci.split_at(sci.find(['e', 'E']).unwrap_or(sci.len()));
        format!("{}{exponent}", strip_zeros(mantissa))
    }
}

fn format_float_spec(spec: &Spec, f: f64) -> String {
    let negative = f.is_sign_negative() && !f.is_nan();
    let magnitude = f.abs();
    let upper = matches!(spec.ty, Some('E' | 'F' | 'G'));
    let body = if magnitude.is_nan() {
        "nan".to_string()
    } else if magnitude.is_infinite() {
        "inf".to_string()
    } else {
        match spec.ty {
            Some('f' | 'F') => format!("{magnitude:.*}", spec.precision.unwrap_or(6)),
            Some('e' | 'E') => exp_notation(magnitude, spec.precision.unwrap_or(6), upper),
            Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), magnitude * 100.0),
            Some('g' | 'G' | 'n') => {
                general(magnitude, spec.precision.unwrap_or(6), spec.alternate, upper)
            }
            _ => match spec.precision {
                Some(p) => general(magnitude, p, spec.alternate, false),
                None => format_float(magnitude),
            },
        }
    };
    let body = if upper { body.to_uppercase() } else { body };
    let body = match spec.grouping {
        Some(sep) => {
            let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
            let (int_part, rest) = body.split_at(split);
            format!("{}{rest}", group(int_part, sep, 3))
        }
        None => body,
    };
    pad(spec, sign_prefix(spec, negative), &body, Align::Right)
}

/// Apply fill, alignment and width around `head` (sign/prefix) and `body`.
fn pad(spec: &Spec, head: &str, body: &str, default_align: Align) -> String {
    let len = head.chars().count() + body.chars().count();
    let (fill, align) = match (spec.fill, spec.align) {
        (_, None) if spec.zero => ('0', Align::AfterSign),
        (fill, align) => (fill.unwrap_or(' '), align.unwrap_or(default_align)),
    };
    if len >= spec.width {
        return format!("{head}{body}");
    }
    let padding = spec.width - len;
    let fill_str = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
    match align {
        Align::Left => format!("{head}{body}{}", fill_str(padding)),
        Align::Right => format!("{}{head}{body}", fill_str(padding)),
        Align::Center => {
            let left = padding / 2;
            format!("{}{head}{body}{}", fill_str(left), fill_str(padding - left))
        }
        Align::AfterSign => format!("{head}{}{body}", fill_str(padding)),
    }
}

#[cfg(test)]
mod tests;
