//! Bounded-concurrency, interval-rate-limited FIFO task queue.
//!
//! A [`Queue`] admits tasks under two ceilings at once:
//!
//! - **Concurrency**: at most `max_concurrent` tasks between invocation and
//!   completion.
//! - **Rate window** (optional): at most `max_per_interval` task starts until
//!   the window timer fires. The timer is armed by the first start after a
//!   reset and zeroes the start counter when it elapses. It is a hard
//!   periodic reset, not a sliding window, so a full burst may start right at
//!   a window boundary.
//!
//! Tasks start strictly in submission order. Completion order is whatever
//! the tasks' own latencies make it.
//!
//! Dispatch is level-triggered: it is re-evaluated after every admission,
//! completion and window reset, and keeps starting the head of the pending
//! list until one of the ceilings is hit. A single caller at a time drives
//! the start loop; everyone else only mutates state under the lock and
//! leaves the starting to it.
//!
//! ```rust,ignore
//! let queue = Queue::new(QueueConfig::new(2).with_rate_limit(10, Duration::from_secs(1)))?;
//! let handle = queue.add(|| async { Ok::<_, Infallible>(fetch().await) })?;
//! handle.on_before_start.await?;
//! let value = handle.await?;
//! queue.lock_queue().await?;
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{QueueConfig, RateLimit};
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::deferred::{Deferred, Promise};
use crate::core::error::{Abandoned, QueueError, TaskError};
use crate::core::Spawn;
use crate::runtime::TokioSpawner;

/// Identifier assigned to each task at submission, unique per queue.
pub type TaskId = u64;

/// Future returned by [`Queue::lock_queue`]; resolves once the sealed queue
/// has no pending and no running tasks. Every clone observes the same
/// settlement.
pub type Drained = Shared<Promise<(), Abandoned>>;

/// How a started task ended, as far as the scheduler cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    Panicked,
}

/// Invokes the task and returns the future that drives it to completion and
/// settles its `on_end` promise.
type Launch = Box<dyn FnOnce() -> BoxFuture<'static, Outcome> + Send>;

/// A pending task together with the lifecycle promises it settles.
struct QueueEntry {
    id: TaskId,
    before_start: Deferred<(), Abandoned>,
    after_start: Deferred<(), Abandoned>,
    launch: Launch,
}

/// Caller-side view of one submitted task.
///
/// Awaiting the handle itself is the same as awaiting `on_end`.
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    /// Identifier assigned at submission.
    pub id: TaskId,
    /// Settles right before the task is invoked.
    pub on_before_start: Promise<(), Abandoned>,
    /// Settles right after invocation, before the task's result is known.
    pub on_after_start: Promise<(), Abandoned>,
    /// Settles with the task's value or its failure.
    pub on_end: Promise<T, TaskError<E>>,
}

impl<T, E> IntoFuture for TaskHandle<T, E> {
    type Output = Result<T, TaskError<E>>;
    type IntoFuture = Promise<T, TaskError<E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.on_end
    }
}

/// Point-in-time counters for a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks waiting to start.
    pub pending: usize,
    /// Tasks started and not yet finished.
    pub active: usize,
    /// Starts counted against the current rate window.
    pub started_in_interval: u32,
    /// Whether a window reset timer is armed.
    pub window_open: bool,
    /// Tasks accepted by `add`.
    pub submitted: u64,
    /// Tasks that produced a value.
    pub completed: u64,
    /// Tasks that returned an error or panicked.
    pub failed: u64,
    /// Whether `lock_queue` has been called.
    pub sealed: bool,
    /// Sealed with nothing pending or running.
    pub drained: bool,
}

/// Mutable scheduler state. Only touched with the lock held.
struct QueueState {
    pending: VecDeque<QueueEntry>,
    active: usize,
    sealed: bool,
    started_in_interval: u32,
    reset_timer: Option<JoinHandle<()>>,
    /// Someone is running the start loop.
    pumping: bool,
    /// Last id handed out; ids start at 1.
    next_id: TaskId,
    submitted: u64,
    completed: u64,
    failed: u64,
}

impl QueueState {
    const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            active: 0,
            sealed: false,
            started_in_interval: 0,
            reset_timer: None,
            pumping: false,
            next_id: 0,
            submitted: 0,
            completed: 0,
            failed: 0,
        }
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active == 0
    }
}

struct QueueInner {
    name: String,
    config: QueueConfig,
    rate_limit: Option<RateLimit>,
    spawner: TokioSpawner,
    state: Mutex<QueueState>,
    when_done: Deferred<(), Abandoned>,
    drained: Drained,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

/// Bounded-concurrency, interval-rate-limited FIFO task queue.
///
/// `Queue` is a cheap handle; clones share the same scheduler. Work that was
/// accepted keeps running after every handle is dropped.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

impl Queue {
    /// Create a queue on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] when `max_concurrent` is 0 and
    /// [`QueueError::Runtime`] outside a runtime context.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        crate::builders::QueueBuilder::new(config).build()
    }

    pub(crate) fn from_parts(
        config: QueueConfig,
        spawner: TokioSpawner,
        audit: Option<Box<dyn AuditSink>>,
    ) -> Result<Self, QueueError> {
        config.validate().map_err(QueueError::InvalidConfig)?;

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("queue-{}", uuid::Uuid::new_v4()));
        let rate_limit = config.rate_limit();
        if config.has_partial_rate_limit() {
            warn!(
                "queue {} sets only one of max_per_interval/interval_ms; rate limiting disabled",
                name
            );
        }
        info!(
            queue = %name,
            max_concurrent = config.max_concurrent,
            rate_limit = ?rate_limit,
            "queue created"
        );

        let (when_done, promise) = Deferred::new();
        Ok(Self {
            inner: Arc::new(QueueInner {
                name,
                config,
                rate_limit,
                spawner,
                state: Mutex::new(QueueState::new()),
                when_done,
                drained: promise.shared(),
                audit: audit.map(Mutex::new),
            }),
        })
    }

    /// Queue name used in logs, audit events and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configuration the queue was built with.
    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Whether `lock_queue` has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.inner.state.lock().sealed
    }

    /// Snapshot of the queue's counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock();
        QueueStats {
            pending: state.pending.len(),
            active: state.active,
            started_in_interval: state.started_in_interval,
            window_open: state.reset_timer.is_some(),
            submitted: state.submitted,
            completed: state.completed,
            failed: state.failed,
            sealed: state.sealed,
            drained: state.sealed && state.is_idle(),
        }
    }

    /// Append a task at the tail and try to dispatch.
    ///
    /// The closure is invoked when the task starts; its future then runs on
    /// its own runtime task. Fails with [`QueueError::Sealed`] after
    /// [`lock_queue`](Self::lock_queue), leaving the queue untouched.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Sealed`] once the queue is sealed.
    pub fn add<F, Fut, T, E>(&self, task: F) -> Result<TaskHandle<T, E>, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let inner = &self.inner;
        let (before_start, on_before_start) = Deferred::new();
        let (after_start, on_after_start) = Deferred::new();
        let (end, on_end) = Deferred::new();
        let run = launch(task, end);

        let id = {
            let mut state = inner.state.lock();
            if state.sealed {
                drop(state);
                warn!("queue {} rejected task: sealed", inner.name);
                inner.record(None, AuditAction::Rejected, None);
                return Err(QueueError::Sealed(inner.name.clone()));
            }
            state.next_id += 1;
            let id = state.next_id;
            state.submitted += 1;
            state.pending.push_back(QueueEntry {
                id,
                before_start,
                after_start,
                launch: run,
            });
            inner.record(Some(id), AuditAction::Enqueued, None);
            id
        };

        inner.pump();
        Ok(TaskHandle {
            id,
            on_before_start,
            on_after_start,
            on_end,
        })
    }

    /// Seal the queue and return the future that resolves once it drains.
    ///
    /// Sealing is permanent and idempotent: every call returns a clone of the
    /// same future. If nothing is pending or running the future is already
    /// resolved.
    pub fn lock_queue(&self) -> Drained {
        let inner = &self.inner;
        let (newly_sealed, idle) = {
            let mut state = inner.state.lock();
            let newly_sealed = !state.sealed;
            state.sealed = true;
            (newly_sealed, state.is_idle())
        };
        if newly_sealed {
            info!("queue {} sealed", inner.name);
            inner.record(None, AuditAction::Sealed, None);
        }
        if idle {
            inner.settle_drained();
        }
        inner.drained.clone()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.inner.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl QueueInner {
    /// Run the start loop unless someone else already is.
    ///
    /// The loop only gives up after finding the head ineligible with the
    /// lock held, so changes made by other callers while it runs are seen.
    fn pump(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.pumping {
                return;
            }
            state.pumping = true;
        }
        while let Some(entry) = self.next_eligible() {
            self.start(entry);
        }
    }

    fn next_eligible(self: &Arc<Self>) -> Option<QueueEntry> {
        let mut state = self.state.lock();
        let entry = self.admit(&mut state);
        if entry.is_none() {
            state.pumping = false;
        }
        entry
    }

    /// Pop the head if both ceilings allow it and charge it against them.
    fn admit(self: &Arc<Self>, state: &mut QueueState) -> Option<QueueEntry> {
        if state.pending.is_empty() || state.active >= self.config.max_concurrent {
            return None;
        }
        if let Some(limit) = self.rate_limit {
            if state.started_in_interval >= limit.max_per_interval {
                return None;
            }
        }

        let entry = state.pending.pop_front()?;
        state.active += 1;
        if let Some(limit) = self.rate_limit {
            state.started_in_interval += 1;
            if state.reset_timer.is_none() {
                state.reset_timer = Some(self.arm_reset_timer(limit.interval));
            }
        }
        Some(entry)
    }

    fn arm_reset_timer(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        self.spawner
            .spawn_after(interval, async move { inner.reset_window(); })
    }

    fn reset_window(self: &Arc<Self>) {
        let released = {
            let mut state = self.state.lock();
            let released = state.started_in_interval;
            state.started_in_interval = 0;
            state.reset_timer = None;
            released
        };
        debug!(queue = %self.name, released, "rate window reset");
        self.record(None, AuditAction::WindowReset, None);
        self.pump();
    }

    fn start(self: &Arc<Self>, entry: QueueEntry) {
        let QueueEntry {
            id,
            before_start,
            after_start,
            launch,
        } = entry;

        before_start.resolve(());
        debug!("queue {} starting task {}", self.name, id);
        self.record(Some(id), AuditAction::Started, None);
        let run = launch();
        after_start.resolve(());

        let inner = Arc::clone(self);
        self.spawner.spawn(async move {
            let outcome = run.await;
            inner.finish(id, outcome);
        });
    }

    fn finish(self: &Arc<Self>, id: TaskId, outcome: Outcome) {
        let drained = {
            let mut state = self.state.lock();
            state.active -= 1;
            if outcome == Outcome::Completed {
                state.completed += 1;
            } else {
                state.failed += 1;
            }
            state.sealed && state.is_idle()
        };

        match outcome {
            Outcome::Completed => {
                debug!("queue {} task {} completed", self.name, id);
                self.record(Some(id), AuditAction::Completed, None);
            }
            Outcome::Failed => {
                warn!("queue {} task {} failed", self.name, id);
                self.record(Some(id), AuditAction::Failed, None);
            }
            Outcome::Panicked => {
                warn!("queue {} task {} panicked", self.name, id);
                self.record(Some(id), AuditAction::Failed, Some("panicked".into()));
            }
        }

        if drained {
            self.settle_drained();
        } else {
            self.pump();
        }
    }

    fn settle_drained(&self) {
        if !self.when_done.resolve(()) {
            return;
        }
        // Terminal: nothing is left for a pending reset to release.
        let timer = self.state.lock().reset_timer.take();
        if let Some(timer) = timer {
            timer.abort();
        }
        info!("queue {} drained", self.name);
        self.record(None, AuditAction::Drained, None);
    }

    fn record(&self, task_id: Option<TaskId>, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            let event = build_audit_event(self.name.clone(), task_id, action, detail);
            sink.lock().record(event);
        }
    }
}

/// Wrap a task so that invoking it settles `end` once the task finishes.
///
/// Panics in the closure or its future are caught and reported on `end`,
/// so the scheduler always gets an outcome back.
fn launch<F, Fut, T, E>(task: F, end: Deferred<T, TaskError<E>>) -> Launch
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(move || match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(fut) => async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(value)) => {
                    end.resolve(value);
                    Outcome::Completed
                }
                Ok(Err(err)) => {
                    end.reject(TaskError::Failed(err));
                    Outcome::Failed
                }
                Err(payload) => {
                    end.reject(TaskError::Panicked(panic_message(payload.as_ref())));
                    Outcome::Panicked
                }
            }
        }
        .boxed(),
        Err(payload) => {
            end.reject(TaskError::Panicked(panic_message(payload.as_ref())));
            future::ready(Outcome::Panicked).boxed()
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
