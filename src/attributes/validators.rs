//! Built-in validators.
//!
//! Options are JSON so the same registry interface serves built-in and custom
//! validators. Range style options accept `{"min": a, "max": b}` or `[a, b]`.
//! `length` and `numeric` also take `minimum`/`maximum` for `min`/`max`.

use crate::locale::Translate;
use crate::registry::validator_registry::{ValidationError, ValidatorKey};
use regex::Regex;
use serde_json::Value;

type ValidationResult = Result<(), ValidationError>;

/// Render an option value for a message: strings without quotes
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn bounds(range: &Value) -> Option<(f64, f64)> {
    match range {
        Value::Array(items) if items.len() == 2 => Some((items[0].as_f64()?, items[1].as_f64()?)),
        Value::Object(map) => Some((map.get("min")?.as_f64()?, map.get("max")?.as_f64()?)),
        _ => None,
    }
}

fn bound_params(range: &Value) -> Vec<(&'static str, String)> {
    match bounds(range) {
        Some((min, max)) => vec![("min", trim_float(min)), ("max", trim_float(max))],
        None => vec![("min", display(range)), ("max", display(range))],
    }
}

fn trim_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn fail(locale: &dyn Translate, key: &str, params: &[(&str, String)]) -> ValidationResult {
    Err(ValidationError::new(locale.translate(key, params)))
}

pub fn validate_presence(value: &Value, _options: &Value, locale: &dyn Translate) -> ValidationResult {
    if is_blank(value) {
        fail(locale, "validators.presence", &[])
    } else {
        Ok(())
    }
}

pub fn validate_absence(value: &Value, _options: &Value, locale: &dyn Translate) -> ValidationResult {
    if is_blank(value) {
        Ok(())
    } else {
        fail(locale, "validators.absence", &[])
    }
}

pub fn validate_format(value: &Value, options: &Value, locale: &dyn Translate) -> ValidationResult {
    let compile = |key: &str| -> Result<Option<Regex>, ValidationError> {
        options
            .get(key)
            .and_then(Value::as_str)
            .map(Regex::new)
            .transpose()
            .map_err(|e| ValidationError::new(format!("uses invalid pattern: {e}")))
    };
    let with = compile("with")?;
    let without = compile("without")?;

    let matches = match value.as_str() {
        Some(text) => {
            with.as_ref().map_or(true, |re| re.is_match(text))
                && without.as_ref().map_or(true, |re| !re.is_match(text))
        }
        None => false,
    };

    if matches {
        Ok(())
    } else {
        fail(locale, "validators.format", &[])
    }
}

fn joined_values(values: &[Value]) -> String {
    values.iter().map(display).collect::<Vec<_>>().join(", ")
}

pub fn validate_inclusion(value: &Value, options: &Value, locale: &dyn Translate) -> ValidationResult {
    if let Some(values) = options.get("in").and_then(Value::as_array) {
        if !values.contains(value) {
            return fail(
                locale,
                "validators.inclusion.of",
                &[("values", joined_values(values))],
            );
        }
    }
    if let Some(range) = options.get("within") {
        let inside = match (bounds(range), value.as_f64()) {
            (Some((min, max)), Some(n)) => n >= min && n <= max,
            _ => false,
        };
        if !inside {
            return fail(locale, "validators.inclusion.within", &bound_params(range));
        }
    }
    Ok(())
}

pub fn validate_exclusion(value: &Value, options: &Value, locale: &dyn Translate) -> ValidationResult {
    if let Some(values) = options.get("in").and_then(Value::as_array) {
        if values.contains(value) {
            return fail(
                locale,
                "validators.exclusion.of",
                &[("values", joined_values(values))],
            );
        }
    }
    if let Some(range) = options.get("within") {
        if let (Some((min, max)), Some(n)) = (bounds(range), value.as_f64()) {
            if n >= min && n <= max {
                return fail(locale, "validators.exclusion.within", &bound_params(range));
            }
        }
    }
    Ok(())
}

/// Shared bound checks for `length` and `numeric`
fn check_measure(
    measure: Option<f64>,
    options: &Value,
    prefix: &str,
    locale: &dyn Translate,
) -> ValidationResult {
    let key = |name: &str| format!("{prefix}.{name}");

    if let Some(range) = options.get("within") {
        let inside = matches!((bounds(range), measure), (Some((min, max)), Some(n)) if n >= min && n <= max);
        if !inside {
            return fail(locale, &key("within"), &bound_params(range));
        }
    }
    if let Some(range) = options.get("not_within") {
        let inside = matches!((bounds(range), measure), (Some((min, max)), Some(n)) if n >= min && n <= max);
        if inside || measure.is_none() {
            return fail(locale, &key("not_within"), &bound_params(range));
        }
    }
    if let Some(min) = options.get("min").or_else(|| options.get("minimum")) {
        if !matches!((min.as_f64(), measure), (Some(min), Some(n)) if n >= min) {
            return fail(locale, &key("min"), &[("min", display(min))]);
        }
    }
    if let Some(max) = options.get("max").or_else(|| options.get("maximum")) {
        if !matches!((max.as_f64(), measure), (Some(max), Some(n)) if n <= max) {
            return fail(locale, &key("max"), &[("max", display(max))]);
        }
    }
    if let Some(is) = options.get("is") {
        if !matches!((is.as_f64(), measure), (Some(is), Some(n)) if n == is) {
            return fail(locale, &key("is"), &[("is", display(is))]);
        }
    }
    if let Some(is_not) = options.get("is_not") {
        if matches!((is_not.as_f64(), measure), (Some(is_not), Some(n)) if n == is_not) {
            return fail(locale, &key("is_not"), &[("is_not", display(is_not))]);
        }
    }
    Ok(())
}

pub fn validate_length(value: &Value, options: &Value, locale: &dyn Translate) -> ValidationResult {
    let length = match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        _ => None,
    };
    check_measure(length, options, "validators.length", locale)
}

pub fn validate_numeric(value: &Value, options: &Value, locale: &dyn Translate) -> ValidationResult {
    match value.as_f64() {
        Some(n) => check_measure(Some(n), options, "validators.numeric", locale),
        None => fail(locale, "validators.numeric.nan", &[]),
    }
}

/// Shape an option value must have for a built-in validator
#[derive(Debug, Clone, Copy)]
enum OptionKind {
    Flag,
    Text,
    Pattern,
    List,
    Range,
    Number,
}

impl OptionKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Flag => value.is_boolean(),
            Self::Text => value.is_string(),
            Self::Pattern => value.as_str().is_some_and(|p| Regex::new(p).is_ok()),
            Self::List => value.is_array(),
            Self::Range => bounds(value).is_some(),
            Self::Number => value.as_f64().is_some(),
        }
    }
}

const COMMON_OPTIONS: &[(&str, OptionKind)] =
    &[("message", OptionKind::Text), ("allow_nil", OptionKind::Flag)];

fn option_schema(key: &ValidatorKey) -> Option<&'static [(&'static str, OptionKind)]> {
    use OptionKind::*;
    Some(match key {
        ValidatorKey::Presence | ValidatorKey::Absence => &[],
        ValidatorKey::Format => &[("with", Pattern), ("without", Pattern)],
        ValidatorKey::Inclusion | ValidatorKey::Exclusion => &[("in", List), ("within", Range)],
        ValidatorKey::Length | ValidatorKey::Numeric => &[
            ("within", Range),
            ("not_within", Range),
            ("min", Number),
            ("minimum", Number),
            ("max", Number),
            ("maximum", Number),
            ("is", Number),
            ("is_not", Number),
        ],
        ValidatorKey::Custom(_) => return None,
    })
}

/// Reject options a built-in validator does not understand
///
/// Custom validators own their options and are never checked here.
pub fn check_options(key: &ValidatorKey, options: &Value) -> Result<(), String> {
    let Some(schema) = option_schema(key) else {
        return Ok(());
    };
    let map = match options {
        Value::Object(map) => map,
        Value::Bool(true) if schema.is_empty() => return Ok(()),
        other => return Err(format!("expects an options object, got {other}")),
    };

    for (name, value) in map {
        let kind = schema
            .iter()
            .chain(COMMON_OPTIONS)
            .find(|(known, _)| known == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("does not accept option {name}"))?;
        if !kind.accepts(value) {
            return Err(format!("has an invalid {name} option: {value}"));
        }
    }
    Ok(())
}
