//! # Attribute Resolution
//!
//! Turns an [`Attribute`] declaration into a concrete value for one task:
//!
//! 1. resolve the source into a receiver (context, accessor, literal, ...)
//! 2. check presence on the receiver when the attribute is required
//! 3. derive the raw value, falling back to the default
//! 4. coerce through the ordered candidate types
//! 5. run validations
//!
//! Every failure is recorded in the task's [`Errors`](super::Errors) under the
//! attribute's method name and resolution stops for that attribute. Results
//! are memoized per task, so accessors, defaults and coercions run at most once.

use super::attribute::{Attribute, DefaultValue, Lookup, Source};
use crate::constants::locale_keys;
use crate::error::RuntimeError;
use crate::orchestration::task::Task;
use serde_json::Value;
use tracing::debug;

/// Containing value an attribute is read from
enum Receiver {
    Value(Value),
    Lookup(Lookup),
}

impl Receiver {
    fn exposes(&self, name: &str) -> bool {
        match self {
            Self::Value(Value::Object(map)) => map.contains_key(name),
            Self::Value(_) => false,
            Self::Lookup(_) => true,
        }
    }

    fn derive(&self, task: &Task, name: &str) -> anyhow::Result<Option<Value>> {
        match self {
            Self::Value(Value::Object(map)) => Ok(map.get(name).cloned()),
            Self::Value(_) => Ok(None),
            Self::Lookup(lookup) => lookup(task, name),
        }
    }
}

/// Resolution scope inherited from an enclosing attribute
#[derive(Debug, Clone)]
struct Parent {
    value: Value,
    required: bool,
}

/// Resolve every declared attribute (and its children) for `task`
pub(crate) fn resolve_all(task: &mut Task) {
    let definition = task.definition().clone();
    for attribute in definition.attributes() {
        resolve_tree(task, attribute, None);
    }
}

fn resolve_tree(task: &mut Task, attribute: &Attribute, parent: Option<&Parent>) {
    let value = resolve_one(task, attribute, parent);
    if attribute.children().is_empty() {
        return;
    }
    let scope = Parent {
        value: value.unwrap_or(Value::Null),
        required: attribute.is_required(),
    };
    for child in attribute.children() {
        resolve_tree(task, child, Some(&scope));
    }
}

/// Resolve the attribute exposed as `method_name`, resolving its ancestors first
pub(crate) fn resolve_named(task: &mut Task, method_name: &str) -> Option<Value> {
    let definition = task.definition().clone();
    let path = definition
        .attributes()
        .iter()
        .find_map(|attribute| attribute.path_to(method_name))?;

    let mut parent: Option<Parent> = None;
    let mut value = None;
    for attribute in path {
        value = resolve_one(task, attribute, parent.as_ref());
        parent = Some(Parent {
            value: value.clone().unwrap_or(Value::Null),
            required: attribute.is_required(),
        });
    }
    value
}

/// A child is only enforced as required when its parent is required and present
fn effectively_required(attribute: &Attribute, parent: Option<&Parent>) -> bool {
    attribute.is_required() && parent.map_or(true, |p| p.required && !p.value.is_null())
}

/// Memoized resolution of a single attribute
///
/// Returns `None` when resolution recorded an error.
fn resolve_one(task: &mut Task, attribute: &Attribute, parent: Option<&Parent>) -> Option<Value> {
    let key = attribute.method_name();
    if let Some(cached) = task.cached_attribute(&key) {
        return cached;
    }

    let resolved = compute(task, attribute, parent, &key);
    debug!(
        task = %task.name(),
        attribute = %key,
        resolved = resolved.is_some(),
        "Resolved attribute"
    );
    task.cache_attribute(key, resolved.clone());
    resolved
}

fn compute(
    task: &mut Task,
    attribute: &Attribute,
    parent: Option<&Parent>,
    key: &str,
) -> Option<Value> {
    let required = effectively_required(attribute, parent);

    let receiver = match parent {
        Some(parent) => Receiver::Value(parent.value.clone()),
        None => match source_receiver(task, attribute.source_ref()) {
            Ok(receiver) => receiver,
            Err(message) => {
                task.errors_mut().add(key, message);
                return None;
            }
        },
    };

    if required && !receiver.exposes(attribute.name()) {
        let message = task.translate(locale_keys::ATTRIBUTE_REQUIRED, &[]);
        task.errors_mut().add(key, message);
        return None;
    }

    let derived = match receiver.derive(task, attribute.name()) {
        Ok(value) => value.filter(|v| !v.is_null()),
        Err(_) => {
            let message = task.translate(
                locale_keys::ATTRIBUTE_UNDEFINED_METHOD,
                &[("method", attribute.name().to_string())],
            );
            task.errors_mut().add(key, message);
            return None;
        }
    };

    let derived = match derived {
        Some(value) => value,
        None => match default_value(task, attribute) {
            Ok(value) => value,
            Err(message) => {
                task.errors_mut().add(key, message);
                return None;
            }
        },
    };

    let value = if derived.is_null() && !required {
        Value::Null
    } else {
        match coerce(task, attribute, &derived) {
            Ok(value) => value,
            Err(message) => {
                task.errors_mut().add(key, message);
                return None;
            }
        }
    };

    let messages = validate(task, attribute, &value, required);
    if messages.is_empty() {
        Some(value)
    } else {
        for message in messages {
            task.errors_mut().add(key, message);
        }
        None
    }
}

fn source_receiver(task: &Task, source: &Source) -> Result<Receiver, String> {
    let undefined = |label: String| {
        task.translate(locale_keys::ATTRIBUTE_UNDEFINED_SOURCE, &[("source", label)])
    };

    match source {
        Source::Context => Ok(Receiver::Value(task.context().to_json())),
        Source::Literal(value) => Ok(Receiver::Value(value.clone())),
        Source::Method(name) => match task.definition().method(name) {
            Some(accessor) => accessor(task)
                .map(Receiver::Value)
                .map_err(|_| undefined(source.label())),
            None => Err(undefined(source.label())),
        },
        Source::Callable(accessor) => accessor(task)
            .map(Receiver::Value)
            .map_err(|_| undefined(source.label())),
        Source::Lookup(lookup) => Ok(Receiver::Lookup(lookup.clone())),
    }
}

fn default_value(task: &Task, attribute: &Attribute) -> Result<Value, String> {
    match attribute.default_ref() {
        None => Ok(Value::Null),
        Some(DefaultValue::Literal(value)) => Ok(value.clone()),
        Some(DefaultValue::Callable(accessor)) => accessor(task).map_err(|_| {
            task.translate(
                locale_keys::ATTRIBUTE_UNDEFINED_METHOD,
                &[("method", attribute.name().to_string())],
            )
        }),
    }
}

/// First candidate type that accepts the value wins
fn coerce(task: &Task, attribute: &Attribute, value: &Value) -> Result<Value, String> {
    let types = attribute.candidate_types();
    if types.is_empty() {
        return Ok(value.clone());
    }

    let registry = task.settings().coercions.clone();
    let options = attribute.coercion_options_ref();
    if let Some(coerced) = types
        .iter()
        .find_map(|target| registry.coerce(target, value, options).ok())
    {
        return Ok(coerced);
    }

    Err(match types {
        [single] => task.translate(locale_keys::COERCION_INTO, &[("type", single.to_string())]),
        many => task.translate(
            locale_keys::COERCION_INTO_ANY,
            &[(
                "types",
                many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            )],
        ),
    })
}

fn validate(task: &Task, attribute: &Attribute, value: &Value, required: bool) -> Vec<String> {
    let settings = task.settings();
    let mut messages = Vec::new();

    for validation in attribute.validations() {
        if !validation.guard().allows(task) {
            continue;
        }
        if value.is_null() && (validation.allows_nil() || !required) {
            continue;
        }
        match settings.validators.validate(
            validation.key(),
            value,
            validation.options(),
            settings.locale.as_ref(),
        ) {
            Ok(Ok(())) => {}
            Ok(Err(rejected)) => messages.push(rejected.message),
            Err(RuntimeError::InvalidValidatorOptions { validator, problem }) => messages.push(
                task.translate(
                    "validators.invalid_options",
                    &[("validator", validator), ("problem", problem)],
                ),
            ),
            Err(_) => messages.push(task.translate(
                "validators.unknown",
                &[("validator", validation.key().to_string())],
            )),
        }
    }
    messages
}
