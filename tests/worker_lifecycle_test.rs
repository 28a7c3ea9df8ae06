//! Worker outcomes in safe and strict mode

mod common;

use common::{failing, noop, skipping, Counter, Recorder};
use serde_json::json;
use std::io;
use tasker_runtime::orchestration::{ExecutionMode, RaisedError};
use tasker_runtime::prelude::*;
use tasker_runtime::RuntimeError;

#[test]
fn test_successful_work_completes() {
    let result = tasker_runtime::call(noop("Noop"), json!({"id": 1})).unwrap();

    assert!(result.is_success());
    assert!(result.is_complete());
    assert!(result.is_executed());
    assert!(result.is_good());
    assert!(!result.is_bad());
    assert_eq!(result.index(), 0);
    assert!(result.reason().is_none());
}

#[test]
fn test_failed_work_is_returned_in_safe_mode() {
    let result = tasker_runtime::call(failing("Charge", "card declined"), json!({})).unwrap();

    assert!(result.is_failed());
    assert!(result.is_interrupted());
    assert!(result.is_bad());
    assert_eq!(result.reason(), Some("card declined"));
}

#[test]
fn test_skipped_work_is_good() {
    let result = tasker_runtime::call(skipping("Notify", "already sent"), json!({})).unwrap();

    assert!(result.is_skipped());
    assert!(result.is_interrupted());
    assert!(result.is_good());
    assert_eq!(result.reason(), Some("already sent"));
}

#[test]
fn test_strict_mode_halts_on_breakpoint_status() {
    let interrupt = tasker_runtime::call_strict(failing("Charge", "card declined"), json!({}))
        .unwrap_err();
    let fault = interrupt.as_fault().expect("fault");
    assert_eq!(fault.status(), TaskStatus::Failed);
    assert_eq!(fault.reason(), Some("card declined"));

    // Skipped is not a breakpoint by default
    let skipped = tasker_runtime::call_strict(skipping("Notify", "nothing to do"), json!({})).unwrap();
    assert!(skipped.is_skipped());
}

#[test]
fn test_custom_breakpoints() {
    let handler = TaskDefinition::new("Notify")
        .configure(|settings| settings.task_breakpoints = vec![TaskStatus::Skipped])
        .handler(|task| Err(task.skip("quiet hours")));

    let interrupt = tasker_runtime::call_strict(handler, json!({})).unwrap_err();

    assert_eq!(interrupt.as_fault().map(Fault::status), Some(TaskStatus::Skipped));
}

#[test]
fn test_validation_failure_halts_strict_mode() {
    let handler = common::age_definition().handler(|_task| Ok(()));

    let interrupt = tasker_runtime::call_strict(handler, json!({"age": -1})).unwrap_err();

    assert_eq!(
        interrupt.as_fault().and_then(Fault::reason),
        Some("age must be greater than or equal to 0")
    );
}

#[test]
fn test_raised_errors_fail_the_result() {
    let handler = TaskDefinition::new("Import")
        .handler(|_task| Err(io::Error::new(io::ErrorKind::NotFound, "missing.csv").into()));

    let result = tasker_runtime::call(handler.clone(), json!({})).unwrap();
    assert!(result.is_failed());
    assert_eq!(result.reason(), Some("[Error] missing.csv"));
    assert_eq!(result.cause().map(|c| c.kind()), Some("Error"));
    assert_eq!(result.metadata()["cause"]["message"], json!("missing.csv"));

    let interrupt = tasker_runtime::call_strict(handler, json!({})).unwrap_err();
    let raised = interrupt.as_raised().expect("raised error");
    assert!(raised.is::<io::Error>());
}

#[test]
fn test_exception_handler_sees_raised_errors() {
    let recorder = Recorder::new();
    let seen = recorder.clone();
    let handler = TaskDefinition::new("Parse")
        .configure(move |settings| {
            settings.exception_handler = Some(std::sync::Arc::new(move |task: &Task, error: &RaisedError| {
                seen.push(format!("{}: {}", task.name(), error.kind()));
            }));
        })
        .handler(|_task| {
            "x".parse::<u8>()?;
            Ok(())
        });

    let result = tasker_runtime::call(handler, json!({})).unwrap();

    assert!(result.is_failed());
    assert_eq!(recorder.entries(), vec!["Parse: ParseIntError".to_string()]);
}

#[test]
fn test_undefined_work_is_always_surfaced() {
    let recorder = Recorder::new();
    let handler = TaskDefinition::new("Unfinished")
        .on(CallbackType::OnFailed, recorder.callback("on_failed"))
        .without_work();

    let mut task = Task::new(handler.clone(), json!({})).unwrap();
    let interrupt = task.execute().unwrap_err();
    assert!(interrupt.is_undefined_work());
    assert!(task.result().is_failed());
    assert_eq!(
        task.result().reason(),
        Some("Unfinished does not implement its work")
    );
    assert!(recorder.entries().is_empty());

    let strict = tasker_runtime::call_strict(handler, json!({})).unwrap_err();
    assert!(strict.is_undefined_work());
}

#[test]
fn test_results_and_context_are_sealed_after_execution() {
    let mut task = Task::new(noop("Seal"), json!({"a": 1})).unwrap();
    let result = task.execute().unwrap();

    assert!(task.is_sealed());
    assert!(result.is_sealed());
    assert!(task.context().is_sealed());
    assert!(task.chain().is_sealed());
    assert_eq!(
        task.context().insert("b", 2),
        Err(RuntimeError::Sealed("context"))
    );
    assert!(task.add_error("a", "late").is_err());

    let again = task.execute().unwrap_err();
    assert!(again.as_raised().is_some_and(|e| e.is::<RuntimeError>()));
}

#[test]
fn test_sealing_can_be_disabled() {
    let handler = TaskDefinition::new("Open")
        .configure(|settings| settings.seal_results = false)
        .handler(|_task| Ok(()));
    let mut task = Task::new(handler, json!({})).unwrap();

    let result = task.execute().unwrap();

    assert!(!result.is_sealed());
    assert!(!task.context().is_sealed());
    assert!(!task.chain().is_sealed());
}

#[test]
fn test_tags_are_copied_into_the_result() {
    let handler = TaskDefinition::new("Tagged")
        .configure(|settings| settings.tags = vec!["billing".to_string()])
        .handler(|_task| Ok(()));

    let result = tasker_runtime::call(handler, json!({})).unwrap();

    assert_eq!(result.tags().to_vec(), vec!["billing".to_string()]);
    assert_eq!(result.to_json()["tags"], json!(["billing"]));
}

#[test]
fn test_worker_entry_points_match_task_methods() {
    let counter = Counter::new();
    let runs = counter.clone();
    let handler = TaskDefinition::new("Count").handler(move |_task| {
        runs.bump();
        Ok(())
    });

    let mut safe = Task::new(handler.clone(), json!({})).unwrap();
    assert!(Worker::execute(&mut safe).unwrap().is_success());

    let mut strict = Task::new(handler.clone(), json!({})).unwrap();
    assert!(Worker::execute_strict(&mut strict).unwrap().is_success());

    let mut explicit = Task::new(handler, json!({})).unwrap();
    assert!(Worker::run(&mut explicit, ExecutionMode::Safe).is_ok());

    assert_eq!(counter.get(), 3);
}
