//! Error types for queue operations.

use thiserror::Error;

/// A deferred value was dropped before anyone settled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deferred dropped before it was settled")]
pub struct Abandoned;

/// Errors produced by the queue itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was sealed with `lock_queue` and accepts no more tasks.
    #[error("queue `{0}` is sealed")]
    Sealed(String),
    /// Configuration rejected during construction.
    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
    /// No tokio runtime was available to drive tasks and timers.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

/// Failure observed on a task's `on_end` promise.
///
/// `E` is the task's own error type and is carried verbatim in
/// [`TaskError::Failed`].
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// The task produced its own error.
    #[error("task failed: {0}")]
    Failed(E),
    /// The task closure or its future panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The queue went away before the task was settled.
    #[error(transparent)]
    Abandoned(#[from] Abandoned),
    /// The task could not be submitted.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl<E> TaskError<E> {
    /// Return the task's own error, if that is what this is.
    #[must_use]
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// True when the task itself returned an error.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<E> TaskError<TaskError<E>> {
    /// Collapse the error of a task whose body awaited another queued task.
    #[must_use]
    pub fn flatten(self) -> TaskError<E> {
        match self {
            Self::Failed(inner) => inner,
            Self::Panicked(msg) => TaskError::Panicked(msg),
            Self::Abandoned(a) => TaskError::Abandoned(a),
            Self::Queue(err) => TaskError::Queue(err),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
