//! Queue and quota-gate configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Active rate-limit parameters derived from a [`QueueConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum task starts per window.
    pub max_per_interval: u32,
    /// Window length. The start counter resets to zero when it elapses.
    pub interval: Duration,
}

/// Configuration for a single [`Queue`](crate::core::Queue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Name used in logs, audit events and errors. Generated when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Maximum tasks in flight at once. Must be at least 1.
    pub max_concurrent: usize,
    /// Maximum task starts per interval. Needs `interval_ms` to take effect.
    #[serde(default)]
    pub max_per_interval: Option<u32>,
    /// Interval length in milliseconds. Needs `max_per_interval` to take effect.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

impl QueueConfig {
    /// Concurrency-only configuration.
    #[must_use]
    pub const fn new(max_concurrent: usize) -> Self {
        Self {
            name: None,
            max_concurrent,
            max_per_interval: None,
            interval_ms: None,
        }
    }

    /// Set the queue name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enable rate limiting: at most `max_per_interval` starts per `interval`.
    #[must_use]
    pub fn with_rate_limit(mut self, max_per_interval: u32, interval: Duration) -> Self {
        self.max_per_interval = Some(max_per_interval);
        self.interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Rate limit in effect, if any.
    ///
    /// Both values must be present and positive; otherwise only the
    /// concurrency ceiling applies.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimit> {
        match (self.max_per_interval, self.interval_ms) {
            (Some(max), Some(ms)) if max > 0 && ms > 0 => Some(RateLimit {
                max_per_interval: max,
                interval: Duration::from_millis(ms),
            }),
            _ => None,
        }
    }

    /// True when exactly one of the two rate-limit values is usable.
    #[must_use]
    pub fn has_partial_rate_limit(&self) -> bool {
        let max = self.max_per_interval.is_some_and(|m| m > 0);
        let ms = self.interval_ms.is_some_and(|m| m > 0);
        max != ms
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message when `max_concurrent` is 0 or the name is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("name must not be blank".into());
            }
        }
        Ok(())
    }

    /// Parse queue configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message when the JSON is malformed or fails validation.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `{prefix}_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Reads `{prefix}_MAX_CONCURRENT` (required), `{prefix}_MAX_PER_INTERVAL`,
    /// `{prefix}_INTERVAL_MS` and `{prefix}_NAME`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that is missing or unparsable,
    /// or the validation failure.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        let parse = |suffix: &str| -> Result<Option<u64>, String> {
            var(suffix)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|e| format!("{prefix}_{suffix}: {e}"))
                })
                .transpose()
        };

        let max_concurrent = parse("MAX_CONCURRENT")?
            .ok_or_else(|| format!("{prefix}_MAX_CONCURRENT is not set"))?;
        let max_per_interval = parse("MAX_PER_INTERVAL")?
            .map(|v| u32::try_from(v).map_err(|e| format!("{prefix}_MAX_PER_INTERVAL: {e}")))
            .transpose()?;

        let cfg = Self {
            name: var("NAME"),
            max_concurrent: usize::try_from(max_concurrent)
                .map_err(|e| format!("{prefix}_MAX_CONCURRENT: {e}"))?,
            max_per_interval,
            interval_ms: parse("INTERVAL_MS")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(num_cpus::get().max(1))
    }
}

/// Configuration for a [`QuotaGate`](crate::core::QuotaGate): one global
/// quota shared by every submission, plus a quota applied per resource key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Quota shared by all resources.
    pub global: QueueConfig,
    /// Quota applied separately to each resource key.
    pub per_resource: QueueConfig,
}

impl GateConfig {
    /// Validate both quotas.
    ///
    /// # Errors
    ///
    /// Returns the first failure, prefixed with the quota it came from.
    pub fn validate(&self) -> Result<(), String> {
        self.global
            .validate()
            .map_err(|e| format!("global quota invalid: {e}"))?;
        self.per_resource
            .validate()
            .map_err(|e| format!("per-resource quota invalid: {e}"))?;
        Ok(())
    }

    /// Parse gate configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message when the JSON is malformed or fails validation.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
