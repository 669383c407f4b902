//! Configuration models for queues and quota gates.

pub mod queue;

pub use queue::{GateConfig, QueueConfig, RateLimit};
