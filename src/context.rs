//! # Task Context
//!
//! Shared, mutable input mapping handed to a task invocation. Nested
//! invocations usually receive a clone of the parent's handle so they read and
//! write the same values. The top-level worker seals the context once the
//! whole chain has finished.

use crate::error::{Result, RuntimeError};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ContextInner {
    values: Map<String, Value>,
    sealed: bool,
}

/// Cheaply clonable handle over the invocation's input values
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<RwLock<ContextInner>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON value; non-object values produce an empty context
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self::from(values),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().values.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().values.contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let mut inner = self.inner.write();
        if inner.sealed {
            return Err(RuntimeError::Sealed("context"));
        }
        Ok(inner.values.insert(key.into(), value.into()))
    }

    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let mut inner = self.inner.write();
        if inner.sealed {
            return Err(RuntimeError::Sealed("context"));
        }
        Ok(inner.values.remove(key))
    }

    pub fn len(&self) -> usize {
        self.inner.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().values.is_empty()
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().values.clone()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.snapshot())
    }

    pub fn seal(&self) {
        self.inner.write().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.read().sealed
    }

    /// Whether two handles point at the same underlying context
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Context")
            .field("values", &inner.values)
            .field("sealed", &inner.sealed)
            .finish()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ContextInner {
                values,
                sealed: false,
            })),
        }
    }
}

impl From<Value> for Context {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}
