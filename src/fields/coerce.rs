//! Defensive conversions from loosely-typed document values.
//!
//! Every function here returns `None` for absent or unusable input; nothing
//! panics and nothing allocates an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Sub-fields probed, in order, when a text concept was stored as an object.
pub const TEXT_SUBFIELDS: &[&str] = &["name", "label", "value", "id", "code"];

/// Sub-fields probed, in order, when a numeric concept was stored as an object.
pub const NUMERIC_SUBFIELDS: &[&str] = &["value", "amount", "total", "count", "quantity"];

// Objects nested deeper than this are treated as malformed.
const MAX_NESTING: usize = 2;

// Epoch values above this are milliseconds, below are seconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Returns true for values that carry no usable information.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Renders a scalar as trimmed text, unwrapping known sub-fields of objects.
pub fn as_text(value: &Value) -> Option<String> {
    text_at_depth(value, 0)
}

fn text_at_depth(value: &Value, depth: usize) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) if depth < MAX_NESTING => TEXT_SUBFIELDS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|sub| text_at_depth(sub, depth + 1)),
        _ => None,
    }
}

/// Reads a decimal from numbers, numeric strings or wrapped objects.
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    decimal_at_depth(value, 0)
}

fn decimal_at_depth(value: &Value, depth: usize) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => parse_decimal(s),
        Value::Object(map) if depth < MAX_NESTING => NUMERIC_SUBFIELDS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|sub| decimal_at_depth(sub, depth + 1)),
        _ => None,
    }
}

/// Parses user-entered numeric text such as `" 1,20,000.50 "`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Reads a whole count (bags); fractional input is truncated toward zero.
pub fn as_count(value: &Value) -> Option<i64> {
    as_decimal(value).and_then(|d| d.trunc().to_i64())
}

/// Reads a point in time from the shapes timestamps have been stored in.
pub fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}

/// Calendar date of [`as_timestamp`].
pub fn as_date(value: &Value) -> Option<NaiveDate> {
    as_timestamp(value).map(|ts| ts.date_naive())
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    if raw.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

/// Parses the textual date formats found across collection versions.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
