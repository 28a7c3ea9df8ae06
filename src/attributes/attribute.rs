//! Attribute declarations.
//!
//! An [`Attribute`] is the static description of one task input. It is built
//! once per [`TaskDefinition`](crate::orchestration::TaskDefinition) and shared
//! by every task instance; per-instance resolution happens in
//! [`super::value`].

use crate::orchestration::guard::Guard;
use crate::orchestration::task::Task;
use crate::registry::coercion_registry::CoercionType;
use crate::registry::validator_registry::ValidatorKey;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Accessor invoked with the task, producing a value
pub type Accessor = Arc<dyn Fn(&Task) -> anyhow::Result<Value> + Send + Sync>;

/// Keyed accessor invoked with the task and the attribute name
pub type Lookup = Arc<dyn Fn(&Task, &str) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Where an attribute's containing value comes from
#[derive(Clone, Default)]
pub enum Source {
    /// The task's input context
    #[default]
    Context,
    /// A named accessor registered on the task definition
    Method(String),
    /// A fixed value
    Literal(Value),
    /// A callable producing the containing value
    Callable(Accessor),
    /// A callable asked directly for the attribute's value by name
    Lookup(Lookup),
}

impl Source {
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn callable(f: impl Fn(&Task) -> anyhow::Result<Value> + Send + Sync + 'static) -> Self {
        Self::Callable(Arc::new(f))
    }

    pub fn lookup(
        f: impl Fn(&Task, &str) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self::Lookup(Arc::new(f))
    }

    /// Name used in `undefined source` messages
    pub fn label(&self) -> String {
        match self {
            Self::Context => "context".to_string(),
            Self::Method(name) => name.clone(),
            Self::Literal(_) => "literal".to_string(),
            Self::Callable(_) => "callable".to_string(),
            Self::Lookup(_) => "lookup".to_string(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Fallback used when derivation yields nothing
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Callable(Accessor),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Callable(_) => f.write_str("Callable"),
        }
    }
}

/// One validator applied to an attribute
#[derive(Debug, Clone)]
pub struct Validation {
    key: ValidatorKey,
    options: Value,
    guard: Guard,
}

impl Validation {
    pub fn new(key: ValidatorKey, options: impl Into<Value>) -> Self {
        Self {
            key,
            options: options.into(),
            guard: Guard::always(),
        }
    }

    pub fn when(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.guard = self.guard.and_when(predicate);
        self
    }

    pub fn unless(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.guard = self.guard.and_unless(predicate);
        self
    }

    pub fn key(&self) -> &ValidatorKey {
        &self.key
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn allows_nil(&self) -> bool {
        self.options
            .get("allow_nil")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    source: Source,
    types: Vec<CoercionType>,
    coercion_options: Value,
    validations: Vec<Validation>,
    default: Option<DefaultValue>,
    required: bool,
    alias: Option<String>,
    prefix: Option<String>,
    suffix: Option<String>,
    description: Option<String>,
    children: Vec<Attribute>,
}

impl Attribute {
    fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            source: Source::Context,
            types: Vec::new(),
            coercion_options: Value::Null,
            validations: Vec::new(),
            default: None,
            required,
            alias: None,
            prefix: None,
            suffix: None,
            description: None,
            children: Vec::new(),
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Ordered candidate types; the first successful coercion wins
    pub fn types(mut self, types: impl IntoIterator<Item = CoercionType>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    pub fn coercion_options(mut self, options: Value) -> Self {
        self.coercion_options = options;
        self
    }

    pub fn validate(self, key: ValidatorKey, options: impl Into<Value>) -> Self {
        self.validation(Validation::new(key, options))
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with(
        mut self,
        f: impl Fn(&Task) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Callable(Arc::new(f)));
        self
    }

    /// Expose the attribute under a different method name
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Nested attribute read from this attribute's resolved value
    pub fn child(mut self, child: Attribute) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity used for the attribute cache and for error messages
    pub fn method_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!(
                "{}{}{}",
                self.prefix.as_deref().unwrap_or_default(),
                self.name,
                self.suffix.as_deref().unwrap_or_default()
            ),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn source_ref(&self) -> &Source {
        &self.source
    }

    pub fn candidate_types(&self) -> &[CoercionType] {
        &self.types
    }

    pub fn coercion_options_ref(&self) -> &Value {
        &self.coercion_options
    }

    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    pub fn default_ref(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn children(&self) -> &[Attribute] {
        &self.children
    }

    /// Path of attributes from this one down to the attribute exposed as `method_name`
    pub(crate) fn path_to<'a>(&'a self, method_name: &str) -> Option<Vec<&'a Attribute>> {
        if self.method_name() == method_name {
            return Some(vec![self]);
        }
        self.children.iter().find_map(|child| {
            child.path_to(method_name).map(|mut path| {
                path.insert(0, self);
                path
            })
        })
    }
}
