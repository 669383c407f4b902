//! Externally settled one-shot values.
//!
//! A [`Deferred`] is the write half and a [`Promise`] the read half of a
//! single future result. The queue keeps the write halves of every task's
//! lifecycle promises and settles them from its dispatch and completion
//! paths, far away from where the promises were handed out.
//!
//! ```
//! use prometheus_task_queue::core::{Abandoned, Deferred};
//!
//! # tokio_test_block_on(async {
//! let (deferred, promise) = Deferred::<u32, Abandoned>::new();
//! assert!(deferred.resolve(7));
//! assert!(!deferred.resolve(8));
//! assert_eq!(promise.await, Ok(7));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::error::Abandoned;

/// Write half of a one-shot value.
///
/// Settling is first-wins: the first `resolve` or `reject` decides the
/// outcome and every later call is ignored.
pub struct Deferred<T, E> {
    sender: Mutex<Option<oneshot::Sender<Result<T, E>>>>,
}

impl<T, E> Deferred<T, E> {
    /// Create a deferred value and the promise observing it.
    #[must_use]
    pub fn new() -> (Self, Promise<T, E>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            Promise { receiver: rx },
        )
    }

    /// Settle with a value. Returns `false` if already settled.
    #[allow(clippy::must_use_candidate)]
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure. Returns `false` if already settled.
    #[allow(clippy::must_use_candidate)]
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Err(reason))
    }

    /// Whether `resolve` or `reject` has already been called.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let Some(tx) = self.sender.lock().take() else {
            return false;
        };
        // A dropped promise just means nobody is listening.
        let _ = tx.send(outcome);
        true
    }
}

impl<T, E> std::fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.sender.lock().is_none())
            .finish()
    }
}

/// Read half of a [`Deferred`].
///
/// Resolves to `Err(E::from(Abandoned))` if the deferred is dropped without
/// being settled.
#[must_use = "promises do nothing unless awaited"]
pub struct Promise<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for Promise<T, E>
where
    E: From<Abandoned>,
{
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(E::from(Abandoned))))
    }
}

impl<T, E> std::fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise").finish_non_exhaustive()
    }
}
