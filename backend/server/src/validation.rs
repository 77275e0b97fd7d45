//! # Validation
//!
//! Turns an untyped submission into a [`NewObservation`].
//!
//! Two modes share one set of constraints:
//! - **Strict**: API bodies, `meteors` and `minutes` must already be JSON numbers
//! - **Coercing**: form posts, `meteors` and `minutes` may arrive as text and are converted first
//!
//! Fields are checked in order name, meteors, minutes. The first failure wins.
//!
//! Names are measured in UTF-16 code units, so an emoji outside the BMP counts as two.
use serde_json::Value;
use thiserror::Error;

use crate::observation::NewObservation;

pub const NAME_MAX_UNITS: usize = 40;
pub const METEORS_MAX: u32 = 500;
pub const MINUTES_MAX: f64 = 240.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must be 1–40 chars")]
    Name,

    #[error("Meteors must be an integer between 0 and 500")]
    Meteors,

    #[error("Minutes must be > 0 and ≤ 240")]
    Minutes,
}

/// Strict mode, used for `application/json` submissions.
pub fn validate_body(input: &Value) -> Result<NewObservation, ValidationError> {
    Ok(NewObservation {
        name: name(input.get("name"))?,
        meteors: meteors(input.get("meteors").and_then(Value::as_f64))?,
        minutes: minutes(input.get("minutes").and_then(Value::as_f64))?,
    })
}

/// Coercing mode, used for form posts where every value is text.
pub fn validate_form(input: &Value) -> Result<NewObservation, ValidationError> {
    Ok(NewObservation {
        name: name(input.get("name"))?,
        meteors: meteors(Some(coerce_number(input.get("meteors"))))?,
        minutes: minutes(Some(coerce_number(input.get("minutes"))))?,
    })
}

/// Whitespace trim that also drops the byte order mark.
fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn name(value: Option<&Value>) -> Result<String, ValidationError> {
    let trimmed = value
        .and_then(Value::as_str)
        .map(trim)
        .ok_or(ValidationError::Name)?;

    let length = trimmed.encode_utf16().count();
    if length == 0 || length > NAME_MAX_UNITS {
        return Err(ValidationError::Name);
    }

    Ok(trimmed.to_string())
}

fn meteors(value: Option<f64>) -> Result<u32, ValidationError> {
    match value {
        Some(n) if n.fract() == 0.0 && (0.0..=METEORS_MAX as f64).contains(&n) => Ok(n as u32),
        _ => Err(ValidationError::Meteors),
    }
}

fn minutes(value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        Some(n) if n > 0.0 && n <= MINUTES_MAX => Ok(n),
        _ => Err(ValidationError::Minutes),
    }
}

/// Numeric coercion for form values.
///
/// Blank text and `null` become `0`, booleans become `0`/`1`, anything
/// unparseable (or missing) becomes NaN so the range checks reject it.
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        _ => f64::NAN,
    }
}

/// Text to number the way `Number(text)` reads it.
///
/// Accepts decimals with an optional sign and exponent, unsigned `0x`/`0o`/`0b`
/// integers, and `Infinity`. Rust-only spellings such as `inf` or `NaN` are NaN.
fn parse_number(text: &str) -> f64 {
    let s = trim(text);
    if s.is_empty() {
        return 0.0;
    }

    if let Some(radix) = radix_prefix(s) {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }

        return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    if !unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }

    s.parse().unwrap_or(f64::NAN)
}

fn radix_prefix(s: &str) -> Option<u32> {
    match s.get(..2)? {
        "0x" | "0X" => Some(16),
        "0o" | "0O" => Some(8),
        "0b" | "0B" => Some(2),
        _ => None,
    }
}
