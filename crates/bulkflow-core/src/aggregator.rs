//! Outcome aggregation and termination
//!
//! The aggregator is an explicit state machine:
//!
//! ```text
//! Running ──(failure, fail-fast / cancel)──▶ Aborting
//!    │                                          │
//!    └──(producer done, all workers done)──▶ Terminated ◀──┘
//! ```
//!
//! `Terminated` is absorbing: the event loop condition checks it, so the
//! completion signal ends the loop exactly once and nothing received later
//! is counted.

use crate::config::FailurePolicy;
use crate::error::{PipelineError, Result};
use crate::outcome::{Outcome, PipelineResult};
use crate::pool::Event;
use crate::source::WorkItem;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Aggregator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Running,
    Aborting,
    Terminated,
}

/// Why dispatch was stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbortCause {
    Item,
    Listing,
    Cancelled,
}

pub(crate) struct Aggregator<I> {
    state: AggregatorState,
    policy: FailurePolicy,
    cancel: CancellationToken,
    workers_remaining: usize,
    producer_done: bool,
    produced: usize,
    abort_cause: Option<AbortCause>,
    result: PipelineResult<I>,
    started: Instant,
}

impl<I: WorkItem> Aggregator<I> {
    pub(crate) fn new(workers: usize, policy: FailurePolicy, cancel: CancellationToken) -> Self {
        Self {
            state: AggregatorState::Running,
            policy,
            cancel,
            workers_remaining: workers,
            producer_done: false,
            produced: 0,
            abort_cause: None,
            result: PipelineResult::new(),
            started: Instant::now(),
        }
    }

    pub(crate) fn state(&self) -> AggregatorState {
        self.state
    }

    /// Consume events until `Terminated`, then finalize the result
    pub(crate) async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<Event<I>>,
    ) -> Result<PipelineResult<I>> {
        while self.state() != AggregatorState::Terminated {
            let cancel = self.cancel.clone();
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        // Every sender is gone; nothing more can arrive.
                        warn!(
                            workers_remaining = self.workers_remaining,
                            producer_done = self.producer_done,
                            "Event channel closed before all completion signals"
                        );
                        self.transition(AggregatorState::Terminated);
                    }
                },
                _ = cancel.cancelled(), if self.state == AggregatorState::Running => {
                    self.abort(AbortCause::Cancelled);
                }
            }
        }
        events.close();
        self.finish()
    }

    pub(crate) fn handle(&mut self, event: Event<I>) {
        if self.state == AggregatorState::Terminated {
            return;
        }

        match event {
            Event::Outcome(outcome) => self.record(outcome),
            Event::ListingFailed(e) => {
                error!(error = %e, "Listing failed, no further items will be produced");
                self.result.listing_error = Some(e);
                if self.policy == FailurePolicy::FailFast {
                    self.abort(AbortCause::Listing);
                }
            }
            Event::ProducerDone { produced } => {
                debug!(produced, "Producer finished");
                self.producer_done = true;
                self.produced = produced;
            }
            Event::WorkerDone { worker_id } => {
                self.workers_remaining = self.workers_remaining.saturating_sub(1);
                debug!(
                    worker_id,
                    workers_remaining = self.workers_remaining,
                    "Worker finished"
                );
            }
        }

        if self.producer_done && self.workers_remaining == 0 {
            self.transition(AggregatorState::Terminated);
        }
    }

    fn record(&mut self, outcome: Outcome<I>) {
        match outcome {
            Outcome::Success { item, message } => {
                info!(item = %item, "{}", message);
                self.result.add_success();
            }
            Outcome::Failure { item, error } => {
                error!(item = %item, error = %error, "Item failed");
                // Under fail-fast only the first failure is kept.
                let keep =
                    self.policy == FailurePolicy::BestEffort || self.abort_cause.is_none();
                self.result.add_failure(item, error, keep);
                if self.policy == FailurePolicy::FailFast {
                    self.abort(AbortCause::Item);
                }
            }
        }
    }

    fn abort(&mut self, cause: AbortCause) {
        if self.state != AggregatorState::Running {
            return;
        }
        self.abort_cause = Some(cause);
        self.cancel.cancel();
        self.transition(AggregatorState::Aborting);
    }

    fn transition(&mut self, to: AggregatorState) {
        debug!(from = ?self.state, to = ?to, "Aggregator state transition");
        if to == AggregatorState::Aborting {
            self.result.aborted = true;
        }
        self.state = to;
    }

    fn finish(mut self) -> Result<PipelineResult<I>> {
        self.result.duration_ms = self.started.elapsed().as_millis() as u64;
        let summary = self.result.summary();
        let undispatched = self.produced.saturating_sub(self.result.attempted);

        if self.result.is_success() && !self.result.aborted {
            info!(
                policy = %self.policy,
                attempted = summary.attempted,
                succeeded = summary.succeeded,
                failed = summary.failed,
                duration_ms = summary.duration_ms,
                "Bulk operation finished"
            );
        } else {
            warn!(
                policy = %self.policy,
                attempted = summary.attempted,
                succeeded = summary.succeeded,
                failed = summary.failed,
                undispatched,
                aborted = self.result.aborted,
                duration_ms = summary.duration_ms,
                "Bulk operation finished with errors"
            );
        }

        if self.policy == FailurePolicy::BestEffort {
            return Ok(self.result);
        }

        let cause = match self.abort_cause {
            None => return Ok(self.result),
            Some(AbortCause::Cancelled) => PipelineError::Cancelled,
            Some(AbortCause::Listing) => match self.result.listing_error.take() {
                Some(e) => PipelineError::Listing(e),
                None => PipelineError::Cancelled,
            },
            Some(AbortCause::Item) => {
                if self.result.failures.is_empty() {
                    PipelineError::Cancelled
                } else {
                    let first = self.result.failures.remove(0);
                    PipelineError::Item {
                        item: first.item.to_string(),
                        source: first.error,
                    }
                }
            }
        };

        Err(PipelineError::Aborted {
            summary,
            cause: Box::new(cause),
        })
    }
}
