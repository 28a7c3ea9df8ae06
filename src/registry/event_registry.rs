//! # Event Registry
//!
//! Synchronous, best-effort pub/sub for task lifecycle events.
//!
//! ## Overview
//!
//! Subscribers register under one or more event patterns. Publishing walks the
//! matching active subscribers in turn; a subscriber that returns an error or
//! panics is logged and skipped, and never aborts the publishing task.
//!
//! Patterns are exact names, `*`, `prefix*` or `*suffix`.
//!
//! ## Usage
//!
//! ```rust
//! use tasker_runtime::registry::event_registry::{EventRegistry, SubscriberError};
//! use std::sync::Arc;
//!
//! let registry = EventRegistry::new();
//! registry
//!     .register_subscriber(
//!         "audit",
//!         vec!["task.*".to_string()],
//!         Arc::new(|event: &str, _payload: &serde_json::Value| -> Result<(), SubscriberError> {
//!             println!("{event}");
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.publish("task.failed", &serde_json::json!({})), 1);
//! ```

use crate::error::{Result, RuntimeError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

pub trait EventSubscriber: Send + Sync {
    fn handle_event(&self, event_type: &str, payload: &Value) -> std::result::Result<(), SubscriberError>;

    /// Name used in logs
    fn subscriber_name(&self) -> &str {
        "unnamed_subscriber"
    }
}

impl<F> EventSubscriber for F
where
    F: Fn(&str, &Value) -> std::result::Result<(), SubscriberError> + Send + Sync,
{
    fn handle_event(&self, event_type: &str, payload: &Value) -> std::result::Result<(), SubscriberError> {
        self(event_type, payload)
    }
}

#[derive(Clone)]
pub struct Subscription {
    pub subscriber_id: String,
    pub event_patterns: Vec<String>,
    pub subscriber: Arc<dyn EventSubscriber>,
    pub active: bool,
    pub events_received: u64,
    pub failures: u64,
    pub last_event_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Subscription({} -> {}, patterns={:?}, active={}, received={}, failures={})",
            self.subscriber_id,
            self.subscriber.subscriber_name(),
            self.event_patterns,
            self.active,
            self.events_received,
            self.failures
        )
    }
}

#[derive(Debug, Default)]
pub struct EventRegistry {
    /// Subscriber id to subscription
    subscriptions: RwLock<HashMap<String, Subscription>>,
    /// Pattern to subscriber ids, in registration order
    pattern_index: RwLock<HashMap<String, Vec<String>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a subscriber for the given patterns
    pub fn register_subscriber(
        &self,
        subscriber_id: &str,
        event_patterns: Vec<String>,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> Result<()> {
        if event_patterns.is_empty() {
            return Err(RuntimeError::EventError(format!(
                "Subscriber '{subscriber_id}' has no event patterns"
            )));
        }
        if self.subscriptions.read().contains_key(subscriber_id) {
            self.unregister_subscriber(subscriber_id)?;
        }

        let subscription = Subscription {
            subscriber_id: subscriber_id.to_string(),
            event_patterns: event_patterns.clone(),
            subscriber,
            active: true,
            events_received: 0,
            failures: 0,
            last_event_at: None,
        };
        self.subscriptions
            .write()
            .insert(subscriber_id.to_string(), subscription);

        {
            let mut pattern_index = self.pattern_index.write();
            for pattern in event_patterns {
                pattern_index
                    .entry(pattern)
                    .or_default()
                    .push(subscriber_id.to_string());
            }
        }

        info!(subscriber = subscriber_id, "Registered event subscriber");
        Ok(())
    }

    pub fn unregister_subscriber(&self, subscriber_id: &str) -> Result<()> {
        let subscription = self
            .subscriptions
            .write()
            .remove(subscriber_id)
            .ok_or_else(|| not_found(subscriber_id))?;

        let mut pattern_index = self.pattern_index.write();
        for pattern in &subscription.event_patterns {
            if let Some(subscriber_ids) = pattern_index.get_mut(pattern) {
                subscriber_ids.retain(|id| id != subscriber_id);
                if subscriber_ids.is_empty() {
                    pattern_index.remove(pattern);
                }
            }
        }

        info!(subscriber = subscriber_id, "Unregistered event subscriber");
        Ok(())
    }

    /// Deliver an event to every matching active subscriber
    ///
    /// Returns how many subscribers handled the event successfully.
    pub fn publish(&self, event_type: &str, payload: &Value) -> usize {
        let targets = self.find_matching_subscribers(event_type);
        if targets.is_empty() {
            debug!(event_type = event_type, "No subscribers for event");
            return 0;
        }

        let mut delivered = 0;
        for (subscriber_id, subscriber) in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                subscriber.handle_event(event_type, payload)
            }));
            let failed = match outcome {
                Ok(Ok(())) => false,
                Ok(Err(e)) => {
                    error!(
                        subscriber = %subscriber_id,
                        event_type = event_type,
                        error = %e,
                        "Subscriber failed to handle event"
                    );
                    true
                }
                Err(_) => {
                    error!(
                        subscriber = %subscriber_id,
                        event_type = event_type,
                        "Subscriber panicked while handling event"
                    );
                    true
                }
            };
            if !failed {
                delivered += 1;
            }
            self.record_delivery(&subscriber_id, failed);
        }
        delivered
    }

    /// Active subscribers whose patterns match, each listed once
    fn find_matching_subscribers(&self, event_type: &str) -> Vec<(String, Arc<dyn EventSubscriber>)> {
        let pattern_index = self.pattern_index.read();
        let subscriptions = self.subscriptions.read();

        let mut matching: Vec<(String, Arc<dyn EventSubscriber>)> = Vec::new();
        let mut patterns: Vec<&String> = pattern_index
            .keys()
            .filter(|pattern| Self::matches_pattern(event_type, pattern))
            .collect();
        // exact names before wildcards, then a stable order
        patterns.sort_by(|a, b| (a.contains('*'), a.as_str()).cmp(&(b.contains('*'), b.as_str())));

        for pattern in patterns {
            for subscriber_id in &pattern_index[pattern] {
                if matching.iter().any(|(id, _)| id == subscriber_id) {
                    continue;
                }
                if let Some(subscription) = subscriptions.get(subscriber_id) {
                    if subscription.active {
                        matching.push((subscriber_id.clone(), subscription.subscriber.clone()));
                    }
                }
            }
        }
        matching
    }

    pub fn matches_pattern(event_type: &str, pattern: &str) -> bool {
        if pattern == "*" {
            true
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            event_type.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            event_type.ends_with(suffix)
        } else {
            event_type == pattern
        }
    }

    fn record_delivery(&self, subscriber_id: &str, failed: bool) {
        if let Some(subscription) = self.subscriptions.write().get_mut(subscriber_id) {
            subscription.events_received += 1;
            if failed {
                subscription.failures += 1;
            }
            subscription.last_event_at = Some(chrono::Utc::now());
        }
    }

    pub fn get_stats(&self) -> SubscriberStats {
        let mut subscriber_details: Vec<SubscriberDetail> = self
            .subscriptions
            .read()
            .values()
            .map(SubscriberDetail::from)
            .collect();
        subscriber_details.sort_by(|a, b| a.subscriber_id.cmp(&b.subscriber_id));

        SubscriberStats {
            total_subscribers: subscriber_details.len(),
            active_subscribers: subscriber_details.iter().filter(|d| d.active).count(),
            total_patterns: self.pattern_index.read().len(),
            total_events_processed: subscriber_details.iter().map(|d| d.events_received).sum(),
            total_failures: subscriber_details.iter().map(|d| d.failures).sum(),
            subscriber_details,
        }
    }

    pub fn activate_subscriber(&self, subscriber_id: &str) -> Result<()> {
        self.set_active(subscriber_id, true)?;
        info!(subscriber = subscriber_id, "Activated subscriber");
        Ok(())
    }

    pub fn deactivate_subscriber(&self, subscriber_id: &str) -> Result<()> {
        self.set_active(subscriber_id, false)?;
        info!(subscriber = subscriber_id, "Deactivated subscriber");
        Ok(())
    }

    fn set_active(&self, subscriber_id: &str, active: bool) -> Result<()> {
        let mut subscriptions = self.subscriptions.write();
        let subscription = subscriptions
            .get_mut(subscriber_id)
            .ok_or_else(|| not_found(subscriber_id))?;
        subscription.active = active;
        Ok(())
    }

    pub fn list_subscribers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.subscriptions.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn not_found(subscriber_id: &str) -> RuntimeError {
    RuntimeError::EventError(format!("Subscriber '{subscriber_id}' not found"))
}

#[derive(Debug, Clone)]
pub struct SubscriberStats {
    pub total_subscribers: usize,
    pub active_subscribers: usize,
    pub total_patterns: usize,
    pub total_events_processed: u64,
    pub total_failures: u64,
    pub subscriber_details: Vec<SubscriberDetail>,
}

#[derive(Debug, Clone)]
pub struct SubscriberDetail {
    pub subscriber_id: String,
    pub event_patterns: Vec<String>,
    pub active: bool,
    pub events_received: u64,
    pub failures: u64,
    pub last_event_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Subscription> for SubscriberDetail {
    fn from(subscription: &Subscription) -> Self {
        Self {
            subscriber_id: subscription.subscriber_id.clone(),
            event_patterns: subscription.event_patterns.clone(),
            active: subscription.active,
            events_received: subscription.events_received,
            failures: subscription.failures,
            last_event_at: subscription.last_event_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingSubscriber {
        id: String,
        events_handled: AtomicU64,
    }

    impl CountingSubscriber {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                events_handled: AtomicU64::new(0),
            })
        }

        fn events_handled(&self) -> u64 {
            self.events_handled.load(Ordering::Relaxed)
        }
    }

    impl EventSubscriber for CountingSubscriber {
        fn handle_event(&self, _event_type: &str, _payload: &Value) -> std::result::Result<(), SubscriberError> {
            self.events_handled.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn subscriber_name(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_registration_and_stats() {
        let registry = EventRegistry::new();
        assert_eq!(registry.get_stats().total_subscribers, 0);

        registry
            .register_subscriber("counter", vec!["task.failed".to_string()], CountingSubscriber::new("counter"))
            .unwrap();

        let stats = registry.get_stats();
        assert_eq!(stats.total_subscribers, 1);
        assert_eq!(stats.active_subscribers, 1);
        assert_eq!(stats.total_patterns, 1);
        assert!(registry
            .register_subscriber("empty", vec![], CountingSubscriber::new("empty"))
            .is_err());
    }

    #[test]
    fn test_wildcard_patterns() {
        let registry = EventRegistry::new();
        let prefix = CountingSubscriber::new("prefix");
        let suffix = CountingSubscriber::new("suffix");
        let all = CountingSubscriber::new("all");

        registry.register_subscriber("prefix", vec!["task.*".to_string()], prefix.clone()).unwrap();
        registry.register_subscriber("suffix", vec!["*.failed".to_string()], suffix.clone()).unwrap();
        registry
            .register_subscriber("all", vec!["*".to_string(), "task.failed".to_string()], all.clone())
            .unwrap();

        assert_eq!(registry.publish("task.failed", &Value::Null), 3);
        registry.publish("task.success", &Value::Null);
        registry.publish("chain.failed", &Value::Null);

        assert_eq!(prefix.events_handled(), 2);
        assert_eq!(suffix.events_handled(), 2);
        // listed under two matching patterns but delivered once per event
        assert_eq!(all.events_handled(), 3);
    }

    #[test]
    fn test_failing_subscribers_are_isolated() {
        let registry = EventRegistry::new();
        let counter = CountingSubscriber::new("counter");

        registry
            .register_subscriber(
                "broken",
                vec!["*".to_string()],
                Arc::new(|_: &str, _: &Value| -> std::result::Result<(), SubscriberError> {
                    Err("boom".into())
                }),
            )
            .unwrap();
        registry
            .register_subscriber(
                "panicky",
                vec!["*".to_string()],
                Arc::new(|_: &str, _: &Value| -> std::result::Result<(), SubscriberError> {
                    panic!("subscriber exploded")
                }),
            )
            .unwrap();
        registry.register_subscriber("counter", vec!["*".to_string()], counter.clone()).unwrap();

        assert_eq!(registry.publish("task.executed", &Value::Null), 1);
        assert_eq!(counter.events_handled(), 1);
        assert_eq!(registry.get_stats().total_failures, 2);
    }

    #[test]
    fn test_subscriber_lifecycle() {
        let registry = EventRegistry::new();
        let counter = CountingSubscriber::new("lifecycle");
        registry
            .register_subscriber("lifecycle", vec!["task.success".to_string()], counter.clone())
            .unwrap();

        registry.deactivate_subscriber("lifecycle").unwrap();
        registry.publish("task.success", &Value::Null);
        assert_eq!(counter.events_handled(), 0);

        registry.activate_subscriber("lifecycle").unwrap();
        registry.publish("task.success", &Value::Null);
        assert_eq!(counter.events_handled(), 1);

        registry.unregister_subscriber("lifecycle").unwrap();
        assert!(registry.list_subscribers().is_empty());
        assert!(registry.unregister_subscriber("lifecycle").is_err());
        assert!(registry.deactivate_subscriber("missing").is_err());
    }
}
