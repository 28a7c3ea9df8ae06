use crate::registry::event_registry::{EventSubscriber, SubscriberError};
use serde_json::Value;
use tokio::sync::broadcast;

/// Bridges synchronous registry events into a broadcast channel
///
/// Register it on an [`EventRegistry`](crate::registry::event_registry::EventRegistry)
/// and hand [`subscribe`](Self::subscribe) receivers to async consumers.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcast an event, returning how many receivers it reached
    ///
    /// Zero receivers is not an error; events are best-effort.
    pub fn publish(&self, event_name: impl Into<String>, context: Value) -> usize {
        self.sender
            .send(PublishedEvent {
                name: event_name.into(),
                context,
                published_at: chrono::Utc::now(),
            })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSubscriber for EventPublisher {
    fn handle_event(&self, event_type: &str, payload: &Value) -> Result<(), SubscriberError> {
        let reached = self.publish(event_type, payload.clone());
        tracing::trace!(event_type, reached, "Forwarded event to broadcast receivers");
        Ok(())
    }

    fn subscriber_name(&self) -> &str {
        "event_publisher"
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::event_registry::EventRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bridge_forwards_registry_events() {
        let publisher = EventPublisher::new(16);
        let mut receiver = publisher.subscribe();
        let registry = EventRegistry::new();
        registry
            .register_subscriber("bridge", vec!["task.*".to_string()], Arc::new(publisher.clone()))
            .unwrap();

        registry.publish("task.failed", &serde_json::json!({"task_name": "Charge"}));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "task.failed");
        assert_eq!(event.context["task_name"], "Charge");
        assert_eq!(publisher.subscriber_count(), 1);
    }

    #[test]
    fn test_publish_without_listeners() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.publish("task.executed", Value::Null), 0);
    }
}
