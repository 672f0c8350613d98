//! Pipeline configuration

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on concurrent workers
pub const MAX_WORKERS: usize = 1024;

/// What the pipeline does after an item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop dispatching on the first failure and return it as the error
    #[default]
    FailFast,
    /// Process every item and report all failures at the end
    BestEffort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => write!(f, "fail-fast"),
            FailurePolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "best-effort" | "besteffort" => Ok(FailurePolicy::BestEffort),
            other => Err(PipelineError::Configuration(format!(
                "unknown failure policy '{}' (expected fail-fast or best-effort)",
                other
            ))),
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Failure policy
    pub policy: FailurePolicy,

    /// Capacity of the item channel between the source and the workers
    pub queue_capacity: usize,

    /// Maximum dispatches per second (None = unlimited)
    pub rate_limit: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            policy: FailurePolicy::default(),
            queue_capacity: 1,
            rate_limit: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_rate_limit(mut self, per_second: Option<u32>) -> Self {
        self.rate_limit = per_second;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.workers > MAX_WORKERS {
            return Err(PipelineError::Configuration(format!(
                "worker count {} exceeds the maximum of {}",
                self.workers, MAX_WORKERS
            )));
        }
        if self.queue_capacity == 0 {
            return Err(PipelineError::Configuration(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.rate_limit == Some(0) {
            return Err(PipelineError::Configuration(
                "rate limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum spacing between two dispatches
    pub fn dispatch_interval(&self) -> Option<Duration> {
        self.rate_limit
            .filter(|per_second| *per_second > 0)
            .map(|per_second| Duration::from_secs_f64(1.0 / per_second as f64))
    }
}

/// Number of available processing units, 1 if unknown
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
