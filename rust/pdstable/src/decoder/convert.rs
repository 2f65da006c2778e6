//! Statically typed conversions of field text.

use std::borrow::Cow;

use pdstable_format::{Value, ValueKind};

use crate::column::ColumnValues;

/// A storage type of decoded column values.
pub(crate) trait Scalar: Sized + Send + Clone {
    const KIND: ValueKind;

    /// Stored in rows whose conversion failed.
    fn placeholder() -> Self;

    fn eq_value(&self, value: &Value) -> bool;

    fn as_f64(&self) -> Option<f64>;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_values(values: Vec<Self>) -> ColumnValues;
}

impl Scalar for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn placeholder() -> Self {
        0
    }

    fn eq_value(&self, value: &Value) -> bool {
        Value::Integer(*self).loosely_eq(value)
    }

    fn as_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(Self::KIND)? {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    fn into_values(values: Vec<Self>) -> ColumnValues {
        ColumnValues::Integer(values)
    }
}

impl Scalar for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn placeholder() -> Self {
        f64::NAN
    }

    fn eq_value(&self, value: &Value) -> bool {
        Value::Float(*self).loosely_eq(value)
    }

    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(Self::KIND)? {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    fn into_values(values: Vec<Self>) -> ColumnValues {
        ColumnValues::Float(values)
    }
}

impl Scalar for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn placeholder() -> Self {
        false
    }

    fn eq_value(&self, value: &Value) -> bool {
        matches!(value, Value::Boolean(b) if b == self)
    }

    fn as_f64(&self) -> Option<f64> {
        None
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value.coerce(Self::KIND)? {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    fn into_values(values: Vec<Self>) -> ColumnValues {
        ColumnValues::Boolean(values)
    }
}

impl Scalar for String {
    const KIND: ValueKind = ValueKind::String;

    fn placeholder() -> Self {
        String::new()
    }

    fn eq_value(&self, value: &Value) -> bool {
        value.as_str() == Some(self.as_str())
    }

    fn as_f64(&self) -> Option<f64> {
        None
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_values(values: Vec<Self>) -> ColumnValues {
        ColumnValues::String(values)
    }
}

/// Decodes raw field bytes as Latin-1.
pub(crate) fn latin1(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_ascii() {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Cow::Borrowed(text);
        }
    }
    Cow::Owned(bytes.iter().map(|&b| b as char).collect())
}

/// Parses an integer literal in the given base. Surrounding whitespace is ignored, as
/// is a `0x`/`0o`/`0b` prefix matching the base.
pub(crate) fn parse_integer(text: &str, base: u32) -> Option<i64> {
    let text = text.trim();
    if base == 10 {
        return text.parse().ok();
    }
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let prefix = match base {
        16 => Some("0x"),
        8 => Some("0o"),
        2 => Some("0b"),
        _ => None,
    };
    let digits = match (prefix, digits.get(..2)) {
        (Some(prefix), Some(head)) if head.eq_ignore_ascii_case(prefix) => &digits[2..],
        _ => digits,
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, base).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use pdstable_format::Value;

    use super::{Scalar, latin1, parse_float, parse_integer};

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(" -999 ", 10), Some(-999));
        assert_eq!(parse_integer("12.5", 10), None);
        assert_eq!(parse_integer("0x1F", 16), Some(31));
        assert_eq!(parse_integer("-ff", 16), Some(-255));
        assert_eq!(parse_integer("0b101", 2), Some(5));
        assert_eq!(parse_integer("--1", 16), None);
        assert_eq!(parse_integer("", 10), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" 1.5E+03"), Some(1500.0));
        assert_eq!(parse_float("  12"), Some(12.0));
        assert_eq!(parse_float("UNK"), None);
    }

    #[test]
    fn test_latin1() {
        assert_eq!(latin1(b"abc"), "abc");
        assert_eq!(latin1(&[b'C', 0xe9]), "C\u{e9}");
    }

    #[test]
    fn test_scalar_matching() {
        assert!(3i64.eq_value(&Value::Float(3.0)));
        assert!(!3i64.eq_value(&Value::from("3")));
        assert_eq!(i64::from_value(&Value::from("7")), Some(7));
        assert_eq!(f64::from_value(&Value::Integer(2)), Some(2.0));
        assert!(true.eq_value(&Value::Boolean(true)));
        assert!("UNK".to_string().eq_value(&Value::from("UNK")));
    }
}
