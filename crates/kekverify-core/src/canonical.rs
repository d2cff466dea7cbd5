//! Canonical compact JSON.
//!
//! The signer serializes the object field with `,` and `:` separators, no
//! whitespace, keys in insertion order, and every character outside printable
//! ASCII escaped as lowercase `\uXXXX` (UTF-16 surrogate pairs above U+FFFF).
//! Numbers are re-rendered the way the signer's JSON library prints them:
//! integers verbatim, floats in shortest round-trip form with a `.0` suffix
//! for integral values and a signed two-digit exponent in scientific form.
//!
//! The rules are pinned here rather than inherited from `serde_json`'s
//! defaults, which leave non-ASCII unescaped and print floats differently.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;

use crate::error::{Error, Result};

/// Serialize a JSON value to its canonical string.
pub fn canonicalize(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiFormatter);
    value
        .serialize(&mut ser)
        .map_err(|e| Error::Format(format!("failed to serialize canonical JSON: {}", e)))?;
    String::from_utf8(buf)
        .map_err(|e| Error::Format(format!("canonical JSON is not UTF-8: {}", e)))
}

/// Parse a JSON document and return its canonical form.
pub fn canonicalize_str(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Format(format!("invalid JSON: {}", e)))?;
    canonicalize(&value)
}

/// Compact formatter that escapes everything outside printable ASCII.
///
/// The trait defaults already write `,` and `:` with no whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            if start < i {
                writer.write_all(fragment[start..i].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        if start < fragment.len() {
            writer.write_all(fragment[start..].as_bytes())?;
        }
        Ok(())
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(f64::from(value)).as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(number_repr(value).as_bytes())
    }
}

/// Render a JSON number literal as the signer would re-emit it.
fn number_repr(literal: &str) -> String {
    let is_integer = !literal.contains(['.', 'e', 'E']);
    if is_integer {
        if literal == "-0" {
            return "0".to_string();
        }
        return literal.to_string();
    }
    match literal.parse::<f64>() {
        Ok(v) => float_repr(v),
        Err(_) => literal.to_string(),
    }
}

/// Shortest round-trip float rendering: positional for decimal exponents in
/// `[-4, 16)`, scientific otherwise.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sci = format!("{:e}", value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let point = (exp + 1) as usize;
            if digits.len() <= point {
                format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            format!("{sign}0.{}{digits}", "0".repeat((-exp - 1) as usize))
        }
    } else {
        let (head, tail) = digits.split_at(1);
        let frac = if tail.is_empty() {
            String::new()
        } else {
            format!(".{tail}")
        };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{sign}{head}{frac}e{exp_sign}{:02}", exp.abs())
    }
}
