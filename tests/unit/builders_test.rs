//! Tests for builder modules

use std::convert::Infallible;
use std::future::IntoFuture;

use prometheus_task_queue::builders::QueueBuilder;
use prometheus_task_queue::config::QueueConfig;
use prometheus_task_queue::core::QueueError;
use prometheus_task_queue::runtime::TokioSpawner;

#[test]
fn test_builder_keeps_config() {
    let builder = QueueBuilder::new(QueueConfig::new(7).with_name("bases"));
    assert_eq!(builder.config().max_concurrent, 7);
    assert_eq!(builder.config().name.as_deref(), Some("bases"));
}

#[test]
fn test_builder_from_json_rejects_invalid() {
    let err = QueueBuilder::from_json_str(r#"{ "max_concurrent": 0 }"#).unwrap_err();
    assert!(matches!(err, QueueError::InvalidConfig(_)));
}

#[test]
fn test_builder_with_explicit_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    // Built outside any runtime context, driven by the given handle.
    let queue = QueueBuilder::new(QueueConfig::new(2))
        .spawner(TokioSpawner::new(runtime.handle().clone()))
        .build()
        .unwrap();
    let handle = queue.add(|| async { Ok::<_, Infallible>(5) }).unwrap();

    assert_eq!(runtime.block_on(handle.into_future()).unwrap(), 5);
}

#[tokio::test]
async fn test_builder_from_json_builds_queue() {
    let queue = QueueBuilder::from_json_str(r#"{ "name": "json", "max_concurrent": 1 }"#)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(queue.name(), "json");
    assert_eq!(queue.config().max_concurrent, 1);
}
