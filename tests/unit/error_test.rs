//! Tests for error types

use prometheus_task_queue::core::{Abandoned, QueueError, TaskError};

#[test]
fn test_sealed_error() {
    let err = QueueError::Sealed("ingest".to_string());
    assert_eq!(format!("{}", err), "queue `ingest` is sealed");
}

#[test]
fn test_invalid_config_error() {
    let err = QueueError::InvalidConfig("max_concurrent must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid queue configuration: max_concurrent must be greater than 0"
    );
}

#[test]
fn test_task_failure_keeps_reason() {
    let err: TaskError<String> = TaskError::Failed("rate limited upstream".to_string());
    assert_eq!(format!("{}", err), "task failed: rate limited upstream");
    assert!(err.is_failure());
}

#[test]
fn test_abandoned_and_queue_errors_are_transparent() {
    let err: TaskError<String> = Abandoned.into();
    assert_eq!(format!("{}", err), "deferred dropped before it was settled");

    let err: TaskError<String> = QueueError::Sealed("q".into()).into();
    assert_eq!(format!("{}", err), "queue `q` is sealed");
}

#[test]
fn test_app_result_accepts_queue_errors() {
    fn submit() -> prometheus_task_queue::core::AppResult<()> {
        Err(QueueError::Runtime("no reactor".into()))?;
        Ok(())
    }
    let err = submit().unwrap_err();
    assert!(err.downcast_ref::<QueueError>().is_some());
}
