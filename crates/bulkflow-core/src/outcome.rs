//! Per-item outcomes and the aggregate result of a run

use crate::action::ActionError;
use crate::config::FailurePolicy;
use crate::error::ListingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of applying the remote action to one item
#[derive(Debug)]
pub enum Outcome<I> {
    Success { item: I, message: String },
    Failure { item: I, error: ActionError },
}

impl<I> Outcome<I> {
    pub fn item(&self) -> &I {
        match self {
            Outcome::Success { item, .. } | Outcome::Failure { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// A failed item and its cause
#[derive(Debug)]
pub struct ItemFailure<I> {
    pub item: I,
    pub error: ActionError,
}

/// Aggregate result of a pipeline run
///
/// Mutated only by the aggregator while the run is in progress.
#[derive(Debug)]
pub struct PipelineResult<I> {
    /// Items that yielded an outcome
    pub attempted: usize,

    /// Items whose action succeeded
    pub succeeded: usize,

    /// Items whose action failed
    pub failed: usize,

    /// Failed items (the first one only under fail-fast)
    pub failures: Vec<ItemFailure<I>>,

    /// Set when the source stopped on a listing error
    pub listing_error: Option<ListingError>,

    /// Whether dispatch was stopped before the source was exhausted
    pub aborted: bool,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl<I> PipelineResult<I> {
    pub fn new() -> Self {
        Self {
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            listing_error: None,
            aborted: false,
            duration_ms: 0,
        }
    }

    /// No failed items and no listing error
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.listing_error.is_none()
    }

    pub fn add_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    /// Count a failure; `keep` decides whether it goes into the failure list
    pub fn add_failure(&mut self, item: I, error: ActionError, keep: bool) {
        self.attempted += 1;
        self.failed += 1;
        if keep {
            self.failures.push(ItemFailure { item, error });
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            attempted: self.attempted,
            succeeded: self.succeeded,
            failed: self.failed,
            duration_ms: self.duration_ms,
        }
    }
}

impl<I: fmt::Display> PipelineResult<I> {
    /// Serializable snapshot for report output
    pub fn report(&self, policy: FailurePolicy) -> Report {
        Report {
            policy,
            summary: self.summary(),
            failures: self
                .failures
                .iter()
                .map(|f| FailureReport {
                    item: f.item.to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            listing_error: self.listing_error.as_ref().map(|e| e.to_string()),
            aborted: self.aborted,
            finished_at: Utc::now(),
        }
    }
}

impl<I> Default for PipelineResult<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts of a run, printed as the final summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} succeeded, {} failed in {}ms",
            self.attempted, self.succeeded, self.failed, self.duration_ms
        )
    }
}

/// One failure in a [`Report`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub item: String,
    pub error: String,
}

/// Serializable form of a [`PipelineResult`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub policy: FailurePolicy,
    pub summary: Summary,
    pub failures: Vec<FailureReport>,
    pub listing_error: Option<String>,
    pub aborted: bool,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counts() {
        let mut result = PipelineResult::new();
        result.add_success();
        result.add_failure("b".to_string(), "boom".into(), true);
        result.add_failure("c".to_string(), "boom".into(), false);

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].item, "b");
        assert!(!result.is_success());
    }

    #[test]
    fn test_listing_error_is_not_success() {
        let mut result: PipelineResult<String> = PipelineResult::new();
        assert!(result.is_success());

        result.listing_error = Some(ListingError::Request("403".to_string()));
        assert!(!result.is_success());
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            attempted: 3,
            succeeded: 2,
            failed: 1,
            duration_ms: 42,
        };
        assert_eq!(
            summary.to_string(),
            "3 attempted, 2 succeeded, 1 failed in 42ms"
        );
    }

    #[test]
    fn test_report_serializes_failures() {
        let mut result = PipelineResult::new();
        result.add_success();
        result.add_failure("b".to_string(), "not found".into(), true);

        let report = result.report(FailurePolicy::BestEffort);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["policy"], "best-effort");
        assert_eq!(json["summary"]["succeeded"], 1);
        assert_eq!(json["failures"][0]["item"], "b");
        assert_eq!(json["failures"][0]["error"], "not found");
        assert!(json["listing_error"].is_null());
    }
}
