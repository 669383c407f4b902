//! Payload executor abstraction used by batch helpers.

use async_trait::async_trait;

/// Turns a payload into a task result.
///
/// The executor is responsible for the actual business logic; the queue
/// only decides when each payload gets its turn.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_task_queue::core::TaskExecutor;
///
/// #[derive(Clone)]
/// struct RecordFetcher {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl TaskExecutor<String, String> for RecordFetcher {
///     type Error = reqwest::Error;
///
///     async fn execute(&self, url: String) -> Result<String, Self::Error> {
///         self.client.get(url).send().await?.text().await
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor<P, T>: Send + Sync + Clone + 'static
where
    P: Send + 'static,
    T: Send + 'static,
{
    /// Error produced by a failed execution.
    type Error: Send + 'static;

    /// Execute one payload.
    async fn execute(&self, payload: P) -> Result<T, Self::Error>;
}
