//! # Coercion Registry
//!
//! Maps a closed set of type tags (plus named custom entries) to coercion
//! handlers. Built-in handlers live in [`crate::attributes::coercions`];
//! extensions are registered at definition time with [`CoercionRegistry::register`].

use crate::attributes::coercions;
use crate::error::{Result, RuntimeError};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Candidate coercion type for an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoercionType {
    Array,
    Boolean,
    Date,
    DateTime,
    Float,
    Hash,
    Integer,
    String,
    Time,
    Custom(String),
}

impl CoercionType {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for CoercionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array => write!(f, "array"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "datetime"),
            Self::Float => write!(f, "float"),
            Self::Hash => write!(f, "hash"),
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
            Self::Time => write!(f, "time"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl std::str::FromStr for CoercionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "array" => Self::Array,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "datetime" | "date_time" => Self::DateTime,
            "float" => Self::Float,
            "hash" | "object" => Self::Hash,
            "integer" | "int" => Self::Integer,
            "string" => Self::String,
            "time" => Self::Time,
            "" => return Err("Invalid coercion type: empty name".to_string()),
            other => Self::Custom(other.to_string()),
        })
    }
}

/// A single coercion attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not coerce {value} into {target}")]
pub struct CoercionError {
    pub target: String,
    pub value: String,
}

impl CoercionError {
    pub fn new(target: impl fmt::Display, value: &Value) -> Self {
        Self {
            target: target.to_string(),
            value: value.to_string(),
        }
    }
}

/// Converts a derived value into a target type
pub trait Coercion: Send + Sync {
    fn coerce(&self, value: &Value, options: &Value) -> std::result::Result<Value, CoercionError>;
}

impl<F> Coercion for F
where
    F: Fn(&Value, &Value) -> std::result::Result<Value, CoercionError> + Send + Sync,
{
    fn coerce(&self, value: &Value, options: &Value) -> std::result::Result<Value, CoercionError> {
        self(value, options)
    }
}

#[derive(Clone)]
pub struct CoercionRegistry {
    handlers: HashMap<CoercionType, Arc<dyn Coercion>>,
}

impl CoercionRegistry {
    /// Registry pre-populated with the built-in coercions
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register(CoercionType::Array, coercions::coerce_array)
            .register(CoercionType::Boolean, coercions::coerce_boolean)
            .register(CoercionType::Date, coercions::coerce_date)
            .register(CoercionType::DateTime, coercions::coerce_datetime)
            .register(CoercionType::Float, coercions::coerce_float)
            .register(CoercionType::Hash, coercions::coerce_hash)
            .register(CoercionType::Integer, coercions::coerce_integer)
            .register(CoercionType::String, coercions::coerce_string)
            .register(CoercionType::Time, coercions::coerce_time);
        registry
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: CoercionType, handler: impl Coercion + 'static) -> &mut Self {
        debug!(coercion = %key, "Registered coercion");
        self.handlers.insert(key, Arc::new(handler));
        self
    }

    pub fn resolve(&self, key: &CoercionType) -> Result<Arc<dyn Coercion>> {
        self.handlers
            .get(key)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownCoercion(key.to_string()))
    }

    pub fn contains(&self, key: &CoercionType) -> bool {
        self.handlers.contains_key(key)
    }

    /// Coerce with the handler for `key`; an unknown key counts as a failed attempt
    pub fn coerce(
        &self,
        key: &CoercionType,
        value: &Value,
        options: &Value,
    ) -> std::result::Result<Value, CoercionError> {
        match self.handlers.get(key) {
            Some(handler) => handler.coerce(value, options),
            None => Err(CoercionError::new(key, value)),
        }
    }

    pub fn keys(&self) -> Vec<CoercionType> {
        self.handlers.keys().cloned().collect()
    }
}

impl Default for CoercionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CoercionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("CoercionRegistry").field("types", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_are_registered() {
        let registry = CoercionRegistry::new();
        assert!(registry.contains(&CoercionType::Integer));
        assert!(registry.resolve(&CoercionType::custom("money")).is_err());
        assert_eq!(
            registry.coerce(&CoercionType::Integer, &json!("42"), &Value::Null),
            Ok(json!(42))
        );
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = CoercionRegistry::new();
        registry.register(CoercionType::custom("upcase"), |value: &Value, _: &Value| {
            value
                .as_str()
                .map(|s| json!(s.to_uppercase()))
                .ok_or_else(|| CoercionError::new("upcase", value))
        });

        assert_eq!(
            registry.coerce(&CoercionType::custom("upcase"), &json!("ada"), &Value::Null),
            Ok(json!("ADA"))
        );
    }

    #[test]
    fn test_unknown_key_fails_the_attempt() {
        let registry = CoercionRegistry::empty();
        let err = registry
            .coerce(&CoercionType::Integer, &json!("1"), &Value::Null)
            .unwrap_err();
        assert_eq!(err.target, "integer");
    }

    #[test]
    fn test_type_names_parse() {
        assert_eq!("integer".parse::<CoercionType>(), Ok(CoercionType::Integer));
        assert_eq!(
            "money".parse::<CoercionType>(),
            Ok(CoercionType::Custom("money".to_string()))
        );
        assert_eq!(CoercionType::DateTime.to_string(), "datetime");
    }
}
