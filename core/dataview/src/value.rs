//! FILENAME: core/dataview/src/value.rs
//! PURPOSE: Primitive values carried by matrix nodes and property definitions.
//! CONTEXT: The host sends plain JSON scalars, so the enum is untagged.

use serde::{Deserialize, Serialize};

/// A scalar value as it appears in a DataView (group value, measure value,
/// constant expression payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimitiveValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl Default for PrimitiveValue {
    fn default() -> Self {
        PrimitiveValue::Null
    }
}

impl PrimitiveValue {
    pub fn text(s: impl Into<String>) -> Self {
        PrimitiveValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PrimitiveValue::Null)
    }

    /// Truthiness as the host's scripting layer sees it.
    /// `0`, `NaN`, `""`, `false` and null are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PrimitiveValue::Null => false,
            PrimitiveValue::Boolean(b) => *b,
            PrimitiveValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PrimitiveValue::Text(s) => !s.is_empty(),
        }
    }

    /// Returns the numeric reading of this value if it is "numeric":
    /// a finite number, or a string that parses to a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PrimitiveValue::Number(n) if n.is_finite() => Some(*n),
            PrimitiveValue::Text(s) => parse_numeric(s),
            _ => None,
        }
    }

    /// Renders the value the way it would be written into a text expression.
    pub fn to_display_string(&self) -> String {
        match self {
            PrimitiveValue::Null => String::new(),
            PrimitiveValue::Boolean(b) => b.to_string(),
            PrimitiveValue::Number(n) => format_number(*n),
            PrimitiveValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for PrimitiveValue {
    fn from(value: f64) -> Self {
        PrimitiveValue::Number(value)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        PrimitiveValue::Boolean(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Text(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Text(value)
    }
}

/// Parses a string as a finite number, ignoring surrounding whitespace.
/// Blank strings are not numeric.
pub fn parse_numeric(s: &str) -> Option<f64> {
    if s.trim().is_empty() {
        return None;
    }
    Some(coerce_numeric_text(s)).filter(|n| n.is_finite())
}

/// Number coercion of text as the host's scripting layer does it (unary
/// plus): blank is 0, `0x`/`0o`/`0b` prefixes select a radix, `Infinity` is
/// spelled out with an optional sign, and anything else is NaN. Unlike
/// `str::parse::<f64>`, `inf` and `NaN` spellings are rejected.
pub fn coerce_numeric_text(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let bytes = trimmed.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return trimmed[2..]
                .chars()
                .try_fold(0.0_f64, |acc, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)))
                .unwrap_or(f64::NAN);
        }
    }

    let decimal_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !decimal_chars || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Integral numbers print without a fractional part ("3", not "3.0").
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
