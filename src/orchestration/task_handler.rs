//! # Task Handlers
//!
//! A [`TaskHandler`] pairs a shared [`TaskDefinition`] (attributes, accessors,
//! callbacks, middlewares and settings) with the task's work. Definitions are
//! built once and shared through `Arc`; per-invocation state lives on
//! [`Task`].
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tasker_runtime::prelude::*;
//!
//! struct Greet {
//!     definition: Arc<TaskDefinition>,
//! }
//!
//! impl TaskHandler for Greet {
//!     fn definition(&self) -> Arc<TaskDefinition> {
//!         self.definition.clone()
//!     }
//!
//!     fn work(&self, task: &mut Task) -> Result<(), Interrupt> {
//!         let name = task.resolve_attribute("name").unwrap_or_default();
//!         task.context().insert("greeting", format!("hello {}", name.as_str().unwrap_or("")))?;
//!         Ok(())
//!     }
//! }
//!
//! let handler = Arc::new(Greet {
//!     definition: TaskDefinition::new("Greet")
//!         .attribute(Attribute::required("name").types([CoercionType::String]))
//!         .build(),
//! });
//! let result = tasker_runtime::call(handler, json!({"name": "Ada"})).unwrap();
//! assert!(result.is_success());
//! ```

use super::errors::Interrupt;
use super::middleware::Middleware;
use super::settings::Settings;
use super::task::Task;
use crate::attributes::attribute::{Accessor, Attribute};
use crate::registry::callback_registry::{Callback, CallbackRegistry, CallbackType};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait TaskHandler: Send + Sync {
    fn definition(&self) -> Arc<TaskDefinition>;

    /// The task's work. Handlers that never override it fail with an undefined-work interrupt.
    fn work(&self, task: &mut Task) -> Result<(), Interrupt> {
        Err(Interrupt::undefined_work(task.name()))
    }
}

pub struct TaskDefinition {
    name: String,
    attributes: Vec<Attribute>,
    methods: HashMap<String, Accessor>,
    callbacks: CallbackRegistry,
    middlewares: Vec<Arc<dyn Middleware>>,
    settings: Settings,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: HashMap::new(),
            callbacks: CallbackRegistry::new(),
            middlewares: Vec::new(),
            settings: Settings::default(),
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Register a named accessor usable as an attribute source
    pub fn define_method(
        mut self,
        name: impl Into<String>,
        accessor: impl Fn(&Task) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Arc::new(accessor));
        self
    }

    pub fn on(mut self, callback_type: CallbackType, callback: Callback) -> Self {
        self.callbacks.register(callback_type, callback);
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn configure(mut self, configure: impl FnOnce(&mut Settings)) -> Self {
        configure(&mut self.settings);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Shared definition plus closure work, for handlers that need no state of their own
    pub fn handler(
        self,
        work: impl Fn(&mut Task) -> Result<(), Interrupt> + Send + Sync + 'static,
    ) -> Arc<dyn TaskHandler> {
        Arc::new(FnHandler {
            definition: self.build(),
            work: Some(Box::new(work)),
        })
    }

    /// Handler whose work is not implemented
    pub fn without_work(self) -> Arc<dyn TaskHandler> {
        Arc::new(FnHandler {
            definition: self.build(),
            work: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn method(&self, name: &str) -> Option<&Accessor> {
        self.methods.get(name)
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("methods", &methods)
            .field("callbacks", &self.callbacks)
            .field(
                "middlewares",
                &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("settings", &self.settings)
            .finish()
    }
}

type WorkFn = Box<dyn Fn(&mut Task) -> Result<(), Interrupt> + Send + Sync>;

struct FnHandler {
    definition: Arc<TaskDefinition>,
    work: Option<WorkFn>,
}

impl TaskHandler for FnHandler {
    fn definition(&self) -> Arc<TaskDefinition> {
        self.definition.clone()
    }

    fn work(&self, task: &mut Task) -> Result<(), Interrupt> {
        match &self.work {
            Some(work) => work(task),
            None => Err(Interrupt::undefined_work(task.name())),
        }
    }
}
