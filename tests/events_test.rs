//! Event publication after finalization

mod common;

use common::{collecting_subscriber, Recorder};
use serde_json::{json, Value};
use std::sync::Arc;
use tasker_runtime::events::EventPublisher;
use tasker_runtime::prelude::*;
use tasker_runtime::registry::event_registry::SubscriberError;

fn with_events(handler: TaskDefinition, registry: &Arc<EventRegistry>) -> TaskDefinition {
    let registry = registry.clone();
    handler.configure(move |settings| settings.events = Some(registry))
}

#[test]
fn test_executed_then_status_events() {
    let recorder = Recorder::new();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber("all", vec!["task.*".to_string()], collecting_subscriber(&recorder))
        .unwrap();

    let handler = with_events(TaskDefinition::new("Publish"), &registry).handler(|_task| Ok(()));
    tasker_runtime::call(handler, json!({})).unwrap();

    let handler = with_events(TaskDefinition::new("Publish"), &registry)
        .handler(|task| Err(task.fail("nope")));
    tasker_runtime::call(handler, json!({})).unwrap();

    assert_eq!(
        recorder.entries(),
        vec!["task.executed", "task.success", "task.executed", "task.failed"]
    );
}

#[test]
fn test_payload_is_the_serialized_result() {
    let payloads = Arc::new(parking_lot::Mutex::new(Vec::<Value>::new()));
    let sink = payloads.clone();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber(
            "failures",
            vec!["task.failed".to_string()],
            Arc::new(move |_event: &str, payload: &Value| -> Result<(), SubscriberError> {
                sink.lock().push(payload.clone());
                Ok(())
            }),
        )
        .unwrap();

    let handler = with_events(TaskDefinition::new("Charge"), &registry)
        .handler(|task| Err(task.fail("card declined")));
    tasker_runtime::call(handler, json!({})).unwrap();

    let payloads = payloads.lock();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["task_name"], json!("Charge"));
    assert_eq!(payloads[0]["status"], json!("failed"));
    assert_eq!(payloads[0]["metadata"]["reason"], json!("card declined"));
}

#[test]
fn test_failing_subscribers_do_not_affect_the_task() {
    let recorder = Recorder::new();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber(
            "broken",
            vec!["*".to_string()],
            Arc::new(|_event: &str, _payload: &Value| -> Result<(), SubscriberError> {
                Err("subscriber offline".into())
            }),
        )
        .unwrap();
    registry
        .register_subscriber(
            "healthy",
            vec!["task.success".to_string()],
            collecting_subscriber(&recorder),
        )
        .unwrap();

    let handler = with_events(TaskDefinition::new("Resilient"), &registry).handler(|_task| Ok(()));
    let result = tasker_runtime::call(handler, json!({})).unwrap();

    assert!(result.is_success());
    assert_eq!(recorder.entries(), vec!["task.success"]);

    let stats = registry.get_stats();
    assert_eq!(stats.total_subscribers, 2);
    assert_eq!(stats.total_failures, 2);
}

#[test]
fn test_deactivated_subscribers_are_skipped() {
    let recorder = Recorder::new();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber("audit", vec!["task.failed".to_string()], collecting_subscriber(&recorder))
        .unwrap();
    registry.deactivate_subscriber("audit").unwrap();

    let handler = with_events(TaskDefinition::new("Quiet"), &registry)
        .handler(|task| Err(task.fail("ignored")));
    tasker_runtime::call(handler.clone(), json!({})).unwrap();
    assert!(recorder.entries().is_empty());

    registry.activate_subscriber("audit").unwrap();
    tasker_runtime::call(handler, json!({})).unwrap();
    assert_eq!(recorder.entries(), vec!["task.failed"]);
}

#[test]
fn test_nested_tasks_publish_their_own_events() {
    let recorder = Recorder::new();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber("failed", vec!["*.failed".to_string()], collecting_subscriber(&recorder))
        .unwrap();

    let child = with_events(TaskDefinition::new("Child"), &registry)
        .handler(|task| Err(task.fail("child broke")));
    let parent = with_events(TaskDefinition::new("Parent"), &registry).handler(move |task| {
        let outcome = task.call(child.clone(), json!({}))?;
        Err(task.throw(&outcome))
    });

    tasker_runtime::call(parent, json!({})).unwrap();

    assert_eq!(recorder.entries(), vec!["task.failed", "task.failed"]);
}

#[tokio::test]
async fn test_publisher_bridge_forwards_to_async_consumers() {
    let publisher = Arc::new(EventPublisher::new(16));
    let mut receiver = publisher.subscribe();
    let registry = Arc::new(EventRegistry::new());
    registry
        .register_subscriber("bridge", vec!["task.executed".to_string()], publisher.clone())
        .unwrap();

    let handler = with_events(TaskDefinition::new("Bridged"), &registry).handler(|_task| Ok(()));
    let result = tasker_runtime::call(handler, json!({})).unwrap();

    let event = receiver.recv().await.unwrap();
    assert_eq!(event.name, "task.executed");
    assert_eq!(event.context["task_id"], json!(result.task_id()));
}
