//! # Prometheus Task Queue
//!
//! A bounded-concurrency, interval-rate-limited task queue for the Prometheus
//! AI Platform.
//!
//! Remote APIs rarely impose a single limit. A provider may cap how many
//! requests are in flight and, separately, how many may start per second,
//! per access token and again per downstream resource. This crate provides
//! the scheduling layer that keeps work inside all of those limits at once.
//!
//! ## Key Features
//!
//! - **Two ceilings at once**: hard in-flight limit plus an optional
//!   fixed-window start limit that resets to zero every interval
//! - **FIFO starts**: tasks begin strictly in submission order
//! - **Lifecycle promises**: per-task `on_before_start`, `on_after_start` and
//!   `on_end`
//! - **Seal and drain**: `lock_queue` stops admission and resolves once every
//!   accepted task has finished
//! - **Failure isolation**: a task's error or panic reaches only that task's
//!   `on_end`; the queue keeps dispatching
//! - **Nested quotas**: `QuotaGate` combines a global queue with lazily
//!   created per-resource queues
//!
//! ## Queue
//!
//! ```rust,ignore
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! use prometheus_task_queue::config::QueueConfig;
//! use prometheus_task_queue::core::Queue;
//!
//! // Two in flight, at most five starts per second.
//! let queue = Queue::new(QueueConfig::new(2).with_rate_limit(5, Duration::from_secs(1)))?;
//!
//! let handle = queue.add(|| async { Ok::<_, Infallible>(fetch_page().await) })?;
//! handle.on_before_start.await?;
//! let page = handle.await?;
//!
//! // No more work; wait for what was accepted.
//! queue.lock_queue().await?;
//! ```
//!
//! ## Batches
//!
//! ```rust,ignore
//! use prometheus_task_queue::core::execute_tasks;
//!
//! let sizes = execute_tasks(urls.into_iter().map(|u| move || fetch_size(u)), 4).await?;
//! ```
//!
//! For complete examples, see `tests/queue_test.rs` and `tests/quota_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct queues from configuration.
pub mod builders;
/// Configuration models for queues and quota gates.
pub mod config;
/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
