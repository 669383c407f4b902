//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::{QueueError, Spawn};

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Capture the runtime the caller is currently running on.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Runtime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, QueueError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| QueueError::Runtime(e.to_string()))
    }

    /// Run `fut` once `delay` has elapsed, measured from now.
    ///
    /// The deadline is fixed before the timer task is first polled, so a
    /// busy runtime does not stretch the delay.
    #[must_use = "dropping the handle detaches the timer; keep it to abort it"]
    pub fn spawn_after<F>(&self, delay: Duration, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fut.await;
        })
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
