//! Fixed column field decoding, shared by all parsers
use crate::prelude::{Constellation, SV};

use std::str::FromStr;

/// Decoded field content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns numerical value, whatever the inner numerical type.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }

    /// Returns integer value. Floats with no fractional part
    /// (like week counters "2.022000000000E+03") are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Decodes a single field: trimmed, empty content is absent,
/// digits only is an integer, Fortran exponents ('D') are accepted
/// for floating point values, anything else is returned as text.
pub fn decode(field: &str) -> Option<Value> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    if field.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = field.parse::<i64>() {
            return Some(Value::Integer(i));
        }
    }
    let float = field.replace(['D', 'd'], "e");
    match float.parse::<f64>() {
        Ok(f) => Some(Value::Float(f)),
        Err(_) => Some(Value::Text(field.to_string())),
    }
}

/// Extracts `line[start..end]`, clamped to the line length.
/// Out of range or non ASCII boundaries yield an empty slice.
pub fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Decodes `line[start..end]`
pub fn decode_at(line: &str, start: usize, end: usize) -> Option<Value> {
    decode(column(line, start, end))
}

/// Decodes `line[start..end]` as a number
pub fn f64_at(line: &str, start: usize, end: usize) -> Option<f64> {
    decode_at(line, start, end)?.as_f64()
}

/// Decodes `line[start..end]` as an integer
pub fn i64_at(line: &str, start: usize, end: usize) -> Option<i64> {
    decode_at(line, start, end)?.as_i64()
}

/// Builds an [SV] from a constellation letter and a decoded PRN field.
pub fn satellite(system: &str, prn: &str) -> Option<SV> {
    let constellation = Constellation::from_str(system.trim()).ok()?;
    let prn = decode(prn)?.as_i64()?;
    let prn = u8::try_from(prn).ok()?;
    Some(SV::new(constellation, prn))
}

/// Replaces blanks found between two digits (or sign) by '0',
/// as some producers pad numbers with blanks: " 12223.444 42" is " 12223.444042".
pub fn zero_filled(field: &str) -> String {
    let bytes = field.as_bytes();
    let numeric = |b: u8| b.is_ascii_digit() || b == b'-';
    field
        .char_indices()
        .map(|(i, c)| {
            let inner = i > 0 && i + 1 < bytes.len();
            if c == ' ' && inner && numeric(bytes[i - 1]) && numeric(bytes[i + 1]) {
                '0'
            } else {
                c
            }
        })
        .collect()
}
