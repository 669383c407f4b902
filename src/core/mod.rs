//! Core scheduling abstractions: deferred values, the queue and its helpers.

pub mod audit;
pub mod batch;
pub mod deferred;
pub mod error;
pub mod executor;
pub mod queue;
pub mod quota;
pub mod spawn;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use batch::{execute_tasks, execute_with};
pub use deferred::{Deferred, Promise};
pub use error::{Abandoned, AppResult, QueueError, TaskError};
pub use executor::TaskExecutor;
pub use queue::{Drained, Queue, QueueStats, TaskHandle, TaskId};
pub use quota::QuotaGate;
pub use spawn::Spawn;
