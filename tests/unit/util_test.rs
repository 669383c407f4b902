//! Tests for utility functions

use prometheus_task_queue::util::{init_tracing, now_ms, DEFAULT_LOG_FILTER};

#[test]
fn test_now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
    assert!(DEFAULT_LOG_FILTER.starts_with("prometheus_task_queue"));
}
