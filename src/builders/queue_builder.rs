//! Builder wiring a [`Queue`] to its runtime and optional audit sink.

use crate::config::QueueConfig;
use crate::core::{AuditSink, Queue, QueueError};
use crate::runtime::TokioSpawner;

/// Builds a [`Queue`] from a [`QueueConfig`].
///
/// Without an explicit spawner the queue runs on the tokio runtime that is
/// current when [`build`](Self::build) is called.
pub struct QueueBuilder {
    config: QueueConfig,
    spawner: Option<TokioSpawner>,
    audit: Option<Box<dyn AuditSink>>,
}

impl QueueBuilder {
    /// Start from a configuration.
    #[must_use]
    pub const fn new(config: QueueConfig) -> Self {
        Self {
            config,
            spawner: None,
            audit: None,
        }
    }

    /// Parse the configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] for malformed or invalid JSON.
    pub fn from_json_str(input: &str) -> Result<Self, QueueError> {
        QueueConfig::from_json_str(input)
            .map(Self::new)
            .map_err(QueueError::InvalidConfig)
    }

    /// Configuration the queue will be built with.
    #[must_use]
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Run tasks and timers on `spawner` instead of the current runtime.
    #[must_use]
    pub fn spawner(mut self, spawner: TokioSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Record lifecycle events to `sink`.
    #[must_use]
    pub fn audit(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(sink));
        self
    }

    /// Validate the configuration and build the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] for an invalid configuration and
    /// [`QueueError::Runtime`] when no spawner was given and no tokio runtime
    /// is current.
    pub fn build(self) -> Result<Queue, QueueError> {
        self.config.validate().map_err(QueueError::InvalidConfig)?;
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => TokioSpawner::current()?,
        };
        Queue::from_parts(self.config, spawner, self.audit)
    }
}

impl std::fmt::Debug for QueueBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueBuilder")
            .field("config", &self.config)
            .field("spawner", &self.spawner)
            .field("audit", &self.audit.is_some())
            .finish()
    }
}
