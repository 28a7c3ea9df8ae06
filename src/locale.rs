//! # Locale
//!
//! Message templates for attribute, coercion, validation and fault messages.
//! Templates use `%{name}` placeholders. A missing key never fails: it
//! renders a `translation missing` fallback instead.

use std::collections::HashMap;
use std::fmt;

/// Translation service consumed by the attribute pipeline and the worker
pub trait Translate: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;
}

impl fmt::Debug for dyn Translate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<dyn Translate>")
    }
}

const EN: &[(&str, &str)] = &[
    ("attributes.required", "is required"),
    ("attributes.undefined_source", "delegates to undefined source %{source}"),
    ("attributes.undefined_method", "delegates to undefined method %{method}"),
    ("coercions.into", "could not coerce into %{type}"),
    ("coercions.into_any", "could not coerce into one of: %{types}"),
    ("faults.unspecified", "no reason given"),
    ("faults.undefined_work", "%{task} does not implement its work"),
    ("validators.absence", "must be empty"),
    ("validators.presence", "cannot be empty"),
    ("validators.format", "is an invalid format"),
    ("validators.unknown", "uses unknown validator %{validator}"),
    ("validators.invalid_options", "uses validator %{validator}, which %{problem}"),
    ("validators.exclusion.of", "must not be one of: %{values}"),
    ("validators.exclusion.within", "must not be within %{min} and %{max}"),
    ("validators.inclusion.of", "must be one of: %{values}"),
    ("validators.inclusion.within", "must be within %{min} and %{max}"),
    ("validators.length.is", "length must be %{is}"),
    ("validators.length.is_not", "length must not be %{is_not}"),
    ("validators.length.min", "length must be at least %{min}"),
    ("validators.length.max", "length must be at most %{max}"),
    ("validators.length.within", "length must be within %{min} and %{max}"),
    ("validators.length.not_within", "length must not be within %{min} and %{max}"),
    ("validators.numeric.is", "must be %{is}"),
    ("validators.numeric.is_not", "must not be %{is_not}"),
    ("validators.numeric.min", "must be greater than or equal to %{min}"),
    ("validators.numeric.max", "must be less than or equal to %{max}"),
    ("validators.numeric.within", "must be within %{min} and %{max}"),
    ("validators.numeric.not_within", "must not be within %{min} and %{max}"),
    ("validators.numeric.nan", "must be a number"),
];

/// Built-in English templates, optionally overridden per key
#[derive(Debug, Clone)]
pub struct Locale {
    templates: HashMap<String, String>,
}

impl Locale {
    pub fn english() -> Self {
        Self {
            templates: EN
                .iter()
                .map(|(key, template)| ((*key).to_string(), (*template).to_string()))
                .collect(),
        }
    }

    /// Override or add a template
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

impl Translate for Locale {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        match self.templates.get(key) {
            Some(template) => interpolate(template, params),
            None => format!("translation missing: {key}"),
        }
    }
}

/// Replace every `%{name}` placeholder with its parameter
pub fn interpolate(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("%{{{name}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_params() {
        let locale = Locale::english();
        assert_eq!(
            locale.translate("validators.numeric.min", &[("min", "0".to_string())]),
            "must be greater than or equal to 0"
        );
    }

    #[test]
    fn test_missing_key_falls_back() {
        let locale = Locale::english();
        assert_eq!(
            locale.translate("nope.nothing", &[]),
            "translation missing: nope.nothing"
        );
    }

    #[test]
    fn test_overrides_replace_templates() {
        let locale = Locale::english().with_template("attributes.required", "is mandatory");
        assert_eq!(locale.translate("attributes.required", &[]), "is mandatory");
    }
}
