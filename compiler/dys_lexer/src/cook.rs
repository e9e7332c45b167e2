//! Escape processing for string and bytes literal bodies.
//!
//! The lexer only finds literal boundaries; the parser cooks the body text
//! once it knows whether the literal is a plain string, bytes, or a literal
//! fragment of an f-string.

use crate::LexErrorKind;

/// Decode a `str` literal body.
///
/// Unknown escapes keep their backslash, as the host language does.
pub fn cook_str(raw: &str, is_raw: bool) -> Result<String, LexErrorKind> {
    if is_raw || !raw.contains('\\') {
        return Ok(raw.to_owned());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0C'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0B'),
            '0'..='7' => {
                let code = read_octal(esc, &mut chars);
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'x' => out.push(read_hex_char(&mut chars, 2, "\\x")?),
            'u' => out.push(read_hex_char(&mut chars, 4, "\\u")?),
            'U' => out.push(read_hex_char(&mut chars, 8, "\\U")?),
            'N' => {
                return Err(LexErrorKind::InvalidEscape(
                    "named unicode escapes are not supported".to_owned(),
                ))
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

/// Decode a `bytes` literal body.
pub fn cook_bytes(raw: &str, is_raw: bool) -> Result<Vec<u8>, LexErrorKind> {
    if !raw.is_ascii() {
        return Err(LexErrorKind::NonAsciiBytes);
    }
    if is_raw || !raw.contains('\\') {
        return Ok(raw.as_bytes().to_vec());
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u8);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push(b'\\');
            break;
        };
        match esc {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push(b'\\'),
            '\'' => out.push(b'\''),
            '"' => out.push(b'"'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0C),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0B),
            '0'..='7' => {
                let code = read_octal(esc, &mut chars);
                out.push(u8::try_from(code & 0xFF).unwrap_or(0));
            }
            'x' => {
                let c = read_hex_char(&mut chars, 2, "\\x")?;
                out.push(u8::try_from(u32::from(c)).unwrap_or(0));
            }
            other => {
                out.push(b'\\');
                out.push(other as u8);
            }
        }
    }
    Ok(out)
}

fn read_octal(first: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u32 {
    let mut code = first.to_digit(8).unwrap_or(0);
    for _ in 0..2 {
        match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                code = code * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    code
}

fn read_hex_char(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    escape: &str,
) -> Result<char, LexErrorKind> {
    let mut code = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| LexErrorKind::InvalidEscape(format!("truncated {escape} escape")))?;
        code = code * 16 + digit;
    }
    char::from_u32(code)
        .ok_or_else(|| LexErrorKind::InvalidEscape(format!("{escape} escape out of range")))
}
