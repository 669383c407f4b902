//! Tests for audit sink

use std::convert::Infallible;

use prometheus_task_queue::builders::QueueBuilder;
use prometheus_task_queue::config::QueueConfig;
use prometheus_task_queue::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event("q1", Some(1), AuditAction::Enqueued, None));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].queue, "q1");
    assert_eq!(events[0].task_id, Some(1));
    assert_eq!(events[0].action, AuditAction::Enqueued);
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("q1", Some(1), AuditAction::Enqueued, None));
    sink.record(build_audit_event("q1", Some(2), AuditAction::Enqueued, None));
    sink.record(build_audit_event("q1", Some(3), AuditAction::Enqueued, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, Some(2)); // First one popped
    assert_eq!(events[1].task_id, Some(3));
}

#[test]
fn test_audit_action_display() {
    assert_eq!(AuditAction::WindowReset.to_string(), "window_reset");
    assert_eq!(
        serde_json::to_string(&AuditAction::Drained).unwrap(),
        "\"drained\""
    );
}

#[tokio::test]
async fn test_queue_records_lifecycle() {
    let sink = InMemoryAuditSink::new(100);
    let queue = QueueBuilder::new(QueueConfig::new(1).with_name("audited"))
        .audit(sink.clone())
        .build()
        .unwrap();

    let ok = queue.add(|| async { Ok::<u8, &'static str>(1) }).unwrap();
    let bad = queue.add(|| async { Err::<u8, &'static str>("nope") }).unwrap();
    queue.lock_queue().await.unwrap();
    let _ = ok.await;
    let _ = bad.await;
    assert!(queue.add(|| async { Ok::<_, Infallible>(()) }).is_err());

    let actions: Vec<_> = sink.events().iter().map(|e| e.action).collect();
    assert_eq!(actions.first(), Some(&AuditAction::Enqueued));
    assert_eq!(sink.events_for(AuditAction::Started).len(), 2);
    assert_eq!(sink.events_for(AuditAction::Completed).len(), 1);
    assert_eq!(sink.events_for(AuditAction::Failed).len(), 1);
    assert_eq!(sink.events_for(AuditAction::Sealed).len(), 1);
    assert_eq!(sink.events_for(AuditAction::Drained).len(), 1);
    assert_eq!(sink.events_for(AuditAction::Rejected).len(), 1);
    assert_eq!(actions.last(), Some(&AuditAction::Rejected));

    // A rejected add never receives a task id.
    let enqueued: Vec<_> = sink
        .events_for(AuditAction::Enqueued)
        .iter()
        .map(|e| e.task_id)
        .collect();
    assert_eq!(enqueued, vec![Some(1), Some(2)]);
    assert_eq!(sink.events_for(AuditAction::Rejected)[0].task_id, None);
    assert!(sink.events().iter().all(|e| e.queue == "audited"));
}
