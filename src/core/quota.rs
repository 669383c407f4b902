//! Two-dimensional quotas built from nested queues.
//!
//! A [`QuotaGate`] holds one global [`Queue`] shared by every submission and
//! one queue per resource key, created on first use. A submission enters
//! the global queue; when the global quota lets it start, its body submits
//! the real task to the resource's queue and waits for it there. The task
//! therefore only runs once both quotas admit it, and it keeps its global
//! slot until it finishes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::builders::QueueBuilder;
use crate::config::{GateConfig, QueueConfig};
use crate::core::error::{Abandoned, QueueError, TaskError};
use crate::core::queue::Queue;
use crate::runtime::TokioSpawner;

/// Lazily created per-resource queues, shared with the global task bodies.
#[derive(Clone)]
struct ResourceQueues {
    config: QueueConfig,
    spawner: TokioSpawner,
    queues: Arc<Mutex<HashMap<String, Queue>>>,
}

impl ResourceQueues {
    fn get_or_create(&self, key: &str) -> Result<Queue, QueueError> {
        let mut queues = self.queues.lock();
        if let Some(queue) = queues.get(key) {
            return Ok(queue.clone());
        }

        let base = self.config.name.as_deref().unwrap_or("resource");
        let cfg = self.config.clone().with_name(format!("{base}:{key}"));
        let queue = QueueBuilder::new(cfg)
            .spawner(self.spawner.clone())
            .build()?;
        debug!("created quota queue for resource {}", key);
        queues.insert(key.to_string(), queue.clone());
        Ok(queue)
    }

    fn snapshot(&self) -> Vec<Queue> {
        self.queues.lock().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.queues.lock().len()
    }
}

/// Global plus per-resource quota over shared work.
pub struct QuotaGate {
    global: Queue,
    resources: ResourceQueues,
}

impl QuotaGate {
    /// Create a gate on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if either quota is invalid and
    /// [`QueueError::Runtime`] outside a tokio runtime.
    pub fn new(config: GateConfig) -> Result<Self, QueueError> {
        Self::with_spawner(config, TokioSpawner::current()?)
    }

    /// Create a gate whose queues run on `spawner`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if either quota is invalid.
    pub fn with_spawner(config: GateConfig, spawner: TokioSpawner) -> Result<Self, QueueError> {
        config.validate().map_err(QueueError::InvalidConfig)?;
        let GateConfig {
            global: mut global_cfg,
            per_resource,
        } = config;
        if global_cfg.name.is_none() {
            global_cfg.name = Some("global".into());
        }
        let global = QueueBuilder::new(global_cfg)
            .spawner(spawner.clone())
            .build()?;
        Ok(Self {
            global,
            resources: ResourceQueues {
                config: per_resource,
                spawner,
                queues: Arc::new(Mutex::new(HashMap::new())),
            },
        })
    }

    /// The queue holding the global quota.
    #[must_use]
    pub const fn global(&self) -> &Queue {
        &self.global
    }

    /// The queue for `key`, created with the per-resource quota if needed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Runtime`] if a new queue cannot reach the runtime.
    pub fn resource(&self, key: &str) -> Result<Queue, QueueError> {
        self.resources.get_or_create(key)
    }

    /// Number of resource queues created so far.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Run `task` once both the global quota and the quota for `key` admit it.
    ///
    /// The resource queue is looked up when the global quota admits the
    /// submission, so a sealed gate never creates new resource queues.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Queue`] with [`QueueError::Sealed`] once the gate
    /// is sealed, and otherwise whatever the task's `on_end` reports.
    pub async fn submit<F, Fut, T, E>(&self, key: &str, task: F) -> Result<T, TaskError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let resources = self.resources.clone();
        let key = key.to_string();
        let handle = self.global.add(move || {
            let inner = resources
                .get_or_create(&key)
                .and_then(|resource| resource.add(task));
            async move {
                match inner {
                    Ok(handle) => handle.await,
                    Err(err) => Err(TaskError::Queue(err)),
                }
            }
        })?;
        handle.await.map_err(TaskError::flatten)
    }

    /// Seal the global queue, wait for it to drain, then seal and drain
    /// every resource queue.
    ///
    /// Once the global queue is drained no new work can reach the resource
    /// queues, so sealing them afterwards cannot reject anything.
    ///
    /// # Errors
    ///
    /// Returns [`Abandoned`] if a drain future is dropped unsettled.
    pub async fn seal(&self) -> Result<(), Abandoned> {
        self.global.lock_queue().await?;
        for queue in self.resources.snapshot() {
            queue.lock_queue().await?;
        }
        info!("quota gate sealed and drained");
        Ok(())
    }
}

impl std::fmt::Debug for QuotaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGate")
            .field("global", &self.global)
            .field("resources", &self.resources.len())
            .finish()
    }
}
