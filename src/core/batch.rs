//! Run a fixed list of tasks through a throwaway queue.

use std::future::Future;

use crate::config::QueueConfig;
use crate::core::error::TaskError;
use crate::core::executor::TaskExecutor;
use crate::core::queue::Queue;

/// Run every task with at most `max_concurrent` in flight and return the
/// results in input order.
///
/// Slot `i` of the output holds task `i`'s value no matter when it started or
/// finished. The returned future settles only after every task has
/// finished. If any task failed, the failure of the lowest-index failing
/// task is returned instead.
///
/// # Errors
///
/// Returns [`TaskError::Queue`] when `max_concurrent` is 0 or no tokio
/// runtime is current, and otherwise the lowest-index task failure.
///
/// ```rust,ignore
/// let values = execute_tasks(
///     vec![|| async { Ok::<_, Infallible>(1) }, || async { Ok(2) }],
///     2,
/// )
/// .await?;
/// assert_eq!(values, vec![1, 2]);
/// ```
pub async fn execute_tasks<I, F, Fut, T, E>(
    tasks: I,
    max_concurrent: usize,
) -> Result<Vec<T>, TaskError<E>>
where
    I: IntoIterator<Item = F> + Send,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let queue = Queue::new(QueueConfig::new(max_concurrent).with_name("execute-tasks"))?;

    let handles = tasks
        .into_iter()
        .map(|task| queue.add(task))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("execute_tasks submitted {} tasks", handles.len());

    queue.lock_queue().await?;

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }
    Ok(results)
}

/// Like [`execute_tasks`], with each task produced by `executor` from one
/// payload.
///
/// # Errors
///
/// Same as [`execute_tasks`], with the executor's error in
/// [`TaskError::Failed`].
pub async fn execute_with<X, P, T, I>(
    executor: &X,
    payloads: I,
    max_concurrent: usize,
) -> Result<Vec<T>, TaskError<X::Error>>
where
    X: TaskExecutor<P, T>,
    I: IntoIterator<Item = P> + Send,
    P: Send + 'static,
    T: Send + 'static,
{
    let tasks: Vec<_> = payloads
        .into_iter()
        .map(|payload| {
            let executor = executor.clone();
            move || async move { executor.execute(payload).await }
        })
        .collect();
    execute_tasks(tasks, max_concurrent).await
}
