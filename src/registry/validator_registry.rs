//! # Validator Registry
//!
//! Maps validator keys to handlers. An attribute's validations only run when
//! their key resolves here; built-ins live in [`crate::attributes::validators`].

use crate::attributes::validators;
use crate::error::{Result, RuntimeError};
use crate::locale::Translate;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidatorKey {
    Absence,
    Exclusion,
    Format,
    Inclusion,
    Length,
    Numeric,
    Presence,
    Custom(String),
}

impl ValidatorKey {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absence => write!(f, "absence"),
            Self::Exclusion => write!(f, "exclusion"),
            Self::Format => write!(f, "format"),
            Self::Inclusion => write!(f, "inclusion"),
            Self::Length => write!(f, "length"),
            Self::Numeric => write!(f, "numeric"),
            Self::Presence => write!(f, "presence"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl std::str::FromStr for ValidatorKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "absence" => Self::Absence,
            "exclusion" => Self::Exclusion,
            "format" => Self::Format,
            "inclusion" => Self::Inclusion,
            "length" => Self::Length,
            "numeric" => Self::Numeric,
            "presence" => Self::Presence,
            "" => return Err("Invalid validator key: empty name".to_string()),
            other => Self::Custom(other.to_string()),
        })
    }
}

/// A validator rejected a value; the message is user facing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait Validator: Send + Sync {
    fn validate(
        &self,
        value: &Value,
        options: &Value,
        locale: &dyn Translate,
    ) -> std::result::Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value, &Value, &dyn Translate) -> std::result::Result<(), ValidationError>
        + Send
        + Sync,
{
    fn validate(
        &self,
        value: &Value,
        options: &Value,
        locale: &dyn Translate,
    ) -> std::result::Result<(), ValidationError> {
        self(value, options, locale)
    }
}

#[derive(Clone)]
pub struct ValidatorRegistry {
    handlers: HashMap<ValidatorKey, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Registry pre-populated with the built-in validators
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register(ValidatorKey::Absence, validators::validate_absence)
            .register(ValidatorKey::Exclusion, validators::validate_exclusion)
            .register(ValidatorKey::Format, validators::validate_format)
            .register(ValidatorKey::Inclusion, validators::validate_inclusion)
            .register(ValidatorKey::Length, validators::validate_length)
            .register(ValidatorKey::Numeric, validators::validate_numeric)
            .register(ValidatorKey::Presence, validators::validate_presence);
        registry
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: ValidatorKey, handler: impl Validator + 'static) -> &mut Self {
        debug!(validator = %key, "Registered validator");
        self.handlers.insert(key, Arc::new(handler));
        self
    }

    pub fn resolve(&self, key: &ValidatorKey) -> Result<Arc<dyn Validator>> {
        self.handlers
            .get(key)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownValidator(key.to_string()))
    }

    pub fn contains(&self, key: &ValidatorKey) -> bool {
        self.handlers.contains_key(key)
    }

    /// Run the validator for `key`, applying a `message` option override on failure
    ///
    /// Unknown keys and malformed built-in options are declaration errors.
    pub fn validate(
        &self,
        key: &ValidatorKey,
        value: &Value,
        options: &Value,
        locale: &dyn Translate,
    ) -> Result<std::result::Result<(), ValidationError>> {
        let handler = self.resolve(key)?;
        validators::check_options(key, options).map_err(|problem| {
            RuntimeError::InvalidValidatorOptions {
                validator: key.to_string(),
                problem,
            }
        })?;
        Ok(handler.validate(value, options, locale).map_err(|err| {
            match options.get("message").and_then(Value::as_str) {
                Some(message) => ValidationError::new(message),
                None => err,
            }
        }))
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("ValidatorRegistry")
            .field("validators", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use serde_json::json;

    #[test]
    fn test_message_override() {
        let registry = ValidatorRegistry::new();
        let locale = Locale::english();
        let outcome = registry
            .validate(
                &ValidatorKey::Presence,
                &json!(""),
                &json!({"message": "please fill in"}),
                &locale,
            )
            .unwrap();
        assert_eq!(outcome, Err(ValidationError::new("please fill in")));
    }

    #[test]
    fn test_unknown_validator_is_a_declaration_error() {
        let registry = ValidatorRegistry::new();
        let locale = Locale::english();
        let err = registry
            .validate(&ValidatorKey::custom("even"), &json!(2), &Value::Null, &locale)
            .unwrap_err();
        assert_eq!(err, RuntimeError::UnknownValidator("even".to_string()));
    }

    #[test]
    fn test_unrecognized_builtin_options_are_declaration_errors() {
        let registry = ValidatorRegistry::new();
        let locale = Locale::english();
        let err = registry
            .validate(&ValidatorKey::Numeric, &json!(-5), &json!({"greater_than": 0}), &locale)
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::InvalidValidatorOptions {
                validator: "numeric".to_string(),
                problem: "does not accept option greater_than".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_validator() {
        let mut registry = ValidatorRegistry::new();
        registry.register(
            ValidatorKey::custom("even"),
            |value: &Value, _: &Value, _: &dyn Translate| match value.as_i64() {
                Some(n) if n % 2 == 0 => Ok(()),
                _ => Err(ValidationError::new("must be even")),
            },
        );
        let locale = Locale::english();

        assert_eq!(
            registry
                .validate(&ValidatorKey::custom("even"), &json!(3), &Value::Null, &locale)
                .unwrap(),
            Err(ValidationError::new("must be even"))
        );
    }
}
