use crate::constants::ERROR_SEPARATOR;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages grouped by attribute method name
///
/// Messages for one attribute keep insertion order; duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Errors {
    messages: BTreeMap<String, Vec<String>>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, returning false when it was already present
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) -> bool {
        let message = message.into();
        let entry = self.messages.entry(attribute.into()).or_default();
        if entry.contains(&message) {
            return false;
        }
        entry.push(message);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of attributes with at least one message
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.messages.contains_key(attribute)
    }

    pub fn get(&self, attribute: &str) -> &[String] {
        self.messages.get(attribute).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.messages.iter()
    }

    /// `"<attribute> <message>"` for every recorded message
    pub fn full_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .flat_map(|(attribute, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{attribute} {message}"))
            })
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.messages.clone()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .messages
            .iter()
            .map(|(attribute, messages)| {
                (
                    attribute.clone(),
                    Value::Array(messages.iter().cloned().map(Value::String).collect()),
                )
            })
            .collect();
        Value::Object(map)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(ERROR_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut errors = Errors::new();
        assert!(errors.add("age", "is required"));
        assert!(!errors.add("age", "is required"));
        errors.add("age", "must be greater than or equal to 0");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("age").len(), 2);
    }

    #[test]
    fn test_full_messages_and_display() {
        let mut errors = Errors::new();
        errors.add("name", "cannot be empty");
        errors.add("age", "is required");

        assert_eq!(
            errors.full_messages(),
            vec!["age is required", "name cannot be empty"]
        );
        assert_eq!(errors.to_string(), "age is required. name cannot be empty");
    }

    #[test]
    fn test_json_shape() {
        let mut errors = Errors::new();
        errors.add("age", "is required");
        assert_eq!(errors.to_json(), json!({"age": ["is required"]}));
        assert!(errors.get("missing").is_empty());
    }
}
