//! Built-in coercion handlers.
//!
//! Every handler takes the derived value plus the attribute's coercion
//! options and either returns the converted JSON value or a
//! [`CoercionError`]. Dates and times are normalized to ISO-8601 strings.

use crate::registry::coercion_registry::{CoercionError, CoercionType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

type CoercionResult = Result<Value, CoercionError>;

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "0"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"];

fn format_option(options: &Value) -> Option<&str> {
    options.get("format").and_then(Value::as_str)
}

pub fn coerce_integer(value: &Value, _options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Integer, value);
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f.trunc() as i64))
                }
                _ => Err(fail()),
            }
        }
        Value::String(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| fail()),
        _ => Err(fail()),
    }
}

pub fn coerce_float(value: &Value, _options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Float, value);
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
        .ok_or_else(fail)
}

pub fn coerce_boolean(value: &Value, _options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Boolean, value);
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(Value::Bool(true)),
            Some(0) => Ok(Value::Bool(false)),
            _ => Err(fail()),
        },
        Value::String(s) => {
            let normalized = s.trim().to_lowercase();
            if TRUTHY.contains(&normalized.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSY.contains(&normalized.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(fail())
            }
        }
        _ => Err(fail()),
    }
}

pub fn coerce_string(value: &Value, _options: &Value) -> CoercionResult {
    Ok(Value::String(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }))
}

pub fn coerce_array(value: &Value, _options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Array, value);
    match value {
        Value::Array(items) => Ok(Value::Array(items.clone())),
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => Ok(Value::Array(items)),
                _ => Err(fail()),
            }
        }
        Value::Object(_) => Err(fail()),
        scalar => Ok(Value::Array(vec![scalar.clone()])),
    }
}

pub fn coerce_hash(value: &Value, _options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Hash, value);
    match value {
        Value::Object(map) => Ok(Value::Object(map.clone())),
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(s) if s.trim_start().starts_with('{') => {
            match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Ok(Value::Object(map)),
                _ => Err(fail()),
            }
        }
        // [["key", value], ...]
        Value::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(key), value]) => Ok((key.clone(), value.clone())),
                _ => Err(fail()),
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        _ => Err(fail()),
    }
}

pub fn coerce_date(value: &Value, options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Date, value);
    let input = value.as_str().map(str::trim).ok_or_else(fail)?;

    let parsed = match format_option(options) {
        Some(format) => NaiveDate::parse_from_str(input, format).ok(),
        None => DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(input)
                    .ok()
                    .map(|dt| dt.date_naive())
            }),
    };

    parsed
        .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
        .ok_or_else(fail)
}

pub fn coerce_datetime(value: &Value, options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::DateTime, value);

    let parsed: Option<DateTime<Utc>> = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0)),
        Value::String(s) => {
            let input = s.trim();
            match format_option(options) {
                Some(format) => NaiveDateTime::parse_from_str(input, format)
                    .ok()
                    .map(|naive| naive.and_utc()),
                None => DateTime::parse_from_rfc3339(input)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
                    .or_else(|| {
                        DATETIME_FORMATS.iter().find_map(|format| {
                            NaiveDateTime::parse_from_str(input, format)
                                .ok()
                                .map(|naive| naive.and_utc())
                        })
                    }),
            }
        }
        _ => None,
    };

    parsed
        .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
        .ok_or_else(fail)
}

pub fn coerce_time(value: &Value, options: &Value) -> CoercionResult {
    let fail = || CoercionError::new(CoercionType::Time, value);
    let input = value.as_str().map(str::trim).ok_or_else(fail)?;

    let parsed = match format_option(options) {
        Some(format) => NaiveTime::parse_from_str(input, format).ok(),
        None => TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(input, format).ok()),
    };

    parsed
        .map(|time| Value::String(time.format("%H:%M:%S").to_string()))
        .ok_or_else(fail)
}
