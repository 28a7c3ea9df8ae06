//! Layered configuration feeding task settings

use serde_json::json;
use std::fs;
use tasker_runtime::config::{ConfigManager, LogFormat};
use tasker_runtime::logging::Severity;
use tasker_runtime::prelude::*;
use tempfile::TempDir;

fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[test]
fn test_loaded_configuration_drives_settings() {
    let dir = config_dir(&[(
        "tasker-runtime.toml",
        r#"
retries = 2
task_breakpoints = ["skipped", "failed"]
seal_results = false
tags = ["payments"]
result_log_level = "debug"

[logging]
level = "tasker_runtime=debug"
format = "json"
"#,
    )]);

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging")
            .unwrap();
    assert_eq!(manager.environment(), "staging");
    assert_eq!(manager.config_directory(), dir.path());
    assert_eq!(manager.config().logging.format, LogFormat::Json);

    let settings = Settings::from_config(manager.config()).unwrap();
    assert_eq!(settings.retry.retries, 2);
    assert_eq!(settings.log_level, Severity::Debug);
    assert!(settings.is_breakpoint(TaskStatus::Skipped));

    let handler = TaskDefinition::new("Configured")
        .with_settings(settings)
        .handler(|task| Err(task.skip("nothing to do")));
    let mut task = Task::new(handler, json!({})).unwrap();

    let interrupt = task.execute_strict().unwrap_err();
    assert_eq!(interrupt.as_fault().map(Fault::status), Some(TaskStatus::Skipped));
    assert_eq!(task.result().tags().to_vec(), vec!["payments".to_string()]);
    assert!(!task.result().is_sealed());
}

#[test]
fn test_test_environment_leaves_results_unsealed() {
    let dir = config_dir(&[]);

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
            .unwrap();
    let settings = Settings::from_config(manager.config()).unwrap();

    assert!(!settings.seal_results);
    assert_eq!(settings.retry.retries, 0);
    assert!(settings.is_breakpoint(TaskStatus::Failed));
}

#[test]
fn test_invalid_jitter_is_rejected() {
    let dir = config_dir(&[("tasker-runtime.toml", "retry_jitter_seconds = -2.0\n")]);

    let result =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "development");

    assert!(result.is_err());
}
