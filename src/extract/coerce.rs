//! Conversion of raw extracted strings into typed field values.

use crate::errors::CoerceError;
use crate::models::{ArticleDate, ValueType};
use crate::utils::parse_date;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading numeric prefix accepted by `number` coercion.
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("static regex is valid")
});

/// A typed field value.
///
/// `Number(NaN)` and `Date(None)` are the invalid sentinels for their types;
/// see [`FieldValue::is_invalid`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(Option<DateTime<Utc>>),
    Structured(serde_json::Value),
}

impl FieldValue {
    pub fn is_invalid(&self) -> bool {
        match self {
            FieldValue::Number(n) => n.is_nan(),
            FieldValue::Date(d) => d.is_none(),
            _ => false,
        }
    }

    /// Text rendering for a string slot of a record, `None` for invalid values.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) if n.is_nan() => None,
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Date(Some(d)) => Some(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Date(None) => None,
            FieldValue::Structured(value) => Some(value.to_string()),
        }
    }

    /// Value for the record's date slot. Anything but a valid date keeps `raw`.
    pub fn to_article_date(&self, raw: &str) -> ArticleDate {
        match self {
            FieldValue::Date(Some(d)) => ArticleDate::Timestamp(*d),
            _ => ArticleDate::Raw(raw.to_string()),
        }
    }
}

/// Coerce `raw` into `value_type`.
///
/// # Arguments
///
/// * `raw` - The string read by the field extractor
/// * `value_type` - The field's declared type
///
/// # Returns
///
/// The typed value. Malformed numbers and dates produce their invalid
/// sentinel (`Number(NaN)`, `Date(None)`) rather than an error.
///
/// # Errors
///
/// [`CoerceError::Structured`] when an `object` or `array` field is not valid JSON.
pub fn coerce(raw: &str, value_type: ValueType) -> Result<FieldValue, CoerceError> {
    let value = match value_type {
        ValueType::String => FieldValue::Text(raw.to_string()),
        ValueType::Number => FieldValue::Number(parse_float(raw)),
        ValueType::Boolean => FieldValue::Boolean(raw == "true"),
        ValueType::Date => FieldValue::Date(parse_date(raw)),
        ValueType::Object | ValueType::Array => {
            FieldValue::Structured(serde_json::from_str(raw)?)
        }
    };
    Ok(value)
}

/// Parse the longest leading floating point number, ignoring leading whitespace.
fn parse_float(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let Some(m) = FLOAT_PREFIX.find(trimmed) else {
        return f64::NAN;
    };
    let literal = m.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => f64::NEG_INFINITY,
        "Infinity" => f64::INFINITY,
        _ => literal.parse().unwrap_or(f64::NAN),
    }
}
