#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tasker_runtime::prelude::*;
use tasker_runtime::registry::event_registry::SubscriberError;

/// Ordered log shared between callbacks, middlewares and assertions
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Callback that records `label` and succeeds
    pub fn callback(&self, label: &str) -> Callback {
        let recorder = self.clone();
        let label = label.to_string();
        Callback::new(move |_task: &mut Task| {
            recorder.push(label.clone());
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Integer `age` with a non-negative bound
pub fn age_definition() -> TaskDefinition {
    TaskDefinition::new("AgeCheck").attribute(
        Attribute::required("age")
            .types([CoercionType::Integer])
            .validate(ValidatorKey::Numeric, serde_json::json!({"min": 0})),
    )
}

pub fn noop(name: &str) -> std::sync::Arc<dyn TaskHandler> {
    TaskDefinition::new(name).handler(|_task| Ok(()))
}

pub fn failing(name: &str, reason: &'static str) -> std::sync::Arc<dyn TaskHandler> {
    TaskDefinition::new(name).handler(move |task| Err(task.fail(reason)))
}

pub fn skipping(name: &str, reason: &'static str) -> std::sync::Arc<dyn TaskHandler> {
    TaskDefinition::new(name).handler(move |task| Err(task.skip(reason)))
}

/// Subscriber collecting every event name it receives
pub fn collecting_subscriber(recorder: &Recorder) -> Arc<dyn tasker_runtime::registry::EventSubscriber> {
    let recorder = recorder.clone();
    Arc::new(
        move |event: &str, _payload: &Value| -> Result<(), SubscriberError> {
            recorder.push(event);
            Ok(())
        },
    )
}
