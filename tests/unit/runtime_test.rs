//! Tests for tokio spawner utilities

use std::time::Duration;

use prometheus_task_queue::core::Spawn;
use prometheus_task_queue::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test(start_paused = true)]
async fn test_spawn_after_waits_for_delay() {
    let spawner = TokioSpawner::current().unwrap();
    let start = tokio::time::Instant::now();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let _timer = spawner.spawn_after(Duration::from_millis(250), async move {
        let _ = tx.send(tokio::time::Instant::now());
    });

    let fired_at = rx.await.unwrap();
    assert!(fired_at - start >= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_aborted_timer_never_fires() {
    let spawner = TokioSpawner::current().unwrap();
    let (tx, mut rx) = tokio::sync::oneshot::channel::<()>();
    let timer = spawner.spawn_after(Duration::from_millis(100), async move {
        let _ = tx.send(());
    });
    timer.abort();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_current_outside_runtime_fails() {
    assert!(TokioSpawner::current().is_err());
}
