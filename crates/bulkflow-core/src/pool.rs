//! Producer and worker tasks
//!
//! One producer task pages through the [`WorkSource`] and feeds a bounded
//! item channel. `W` worker tasks compete for items on that channel, apply
//! the [`RemoteAction`] and report one [`Outcome`] per item on the event
//! channel. Both kinds of task report their own completion through a drop
//! guard, so the aggregator sees every completion signal even if a task
//! unwinds.

use crate::action::RemoteAction;
use crate::config::FailurePolicy;
use crate::error::ListingError;
use crate::outcome::Outcome;
use crate::source::{WorkItem, WorkSource};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Messages observed by the aggregator
#[derive(Debug)]
pub(crate) enum Event<I> {
    Outcome(Outcome<I>),
    ListingFailed(ListingError),
    ProducerDone { produced: usize },
    WorkerDone { worker_id: usize },
}

pub(crate) type EventSender<I> = mpsc::UnboundedSender<Event<I>>;
pub(crate) type SharedReceiver<I> = Arc<Mutex<mpsc::Receiver<I>>>;

struct ProducerGuard<I> {
    events: EventSender<I>,
    produced: usize,
}

impl<I> Drop for ProducerGuard<I> {
    fn drop(&mut self) {
        let _ = self.events.send(Event::ProducerDone {
            produced: self.produced,
        });
    }
}

struct WorkerGuard<I> {
    events: EventSender<I>,
    worker_id: usize,
}

impl<I> Drop for WorkerGuard<I> {
    fn drop(&mut self) {
        let _ = self.events.send(Event::WorkerDone {
            worker_id: self.worker_id,
        });
    }
}

/// Spawn the task that pages through `source` into `items`
pub(crate) fn spawn_producer<S: WorkSource>(
    mut source: S,
    items: mpsc::Sender<S::Item>,
    events: EventSender<S::Item>,
    cancel: CancellationToken,
    dispatch_interval: Option<Duration>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut guard = ProducerGuard {
            events: events.clone(),
            produced: 0,
        };
        let mut ticker = dispatch_interval.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut page_no: u32 = 0;

        loop {
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(source = source.name(), "Listing stopped by cancellation");
                    return;
                }
                page = source.next_page() => page,
            };

            let batch = match page {
                Ok(Some(batch)) => batch,
                Ok(None) => {
                    debug!(source = source.name(), pages = page_no, "Listing exhausted");
                    return;
                }
                Err(e) => {
                    // Reported once; items already queued still drain.
                    let _ = events.send(Event::ListingFailed(e));
                    return;
                }
            };
            page_no += 1;
            debug!(
                source = source.name(),
                page = page_no,
                items = batch.len(),
                "Listed page"
            );

            for item in batch {
                if let Some(ticker) = ticker.as_mut() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        _ = ticker.tick() => {}
                    }
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    sent = items.send(item) => {
                        if sent.is_err() {
                            warn!(source = source.name(), "All workers gone, stopping listing");
                            return;
                        }
                        guard.produced += 1;
                    }
                }
            }
        }
    })
}

/// Spawn one worker competing for items on `items`
pub(crate) fn spawn_worker<I, A>(
    worker_id: usize,
    items: SharedReceiver<I>,
    action: Arc<A>,
    events: EventSender<I>,
    cancel: CancellationToken,
    policy: FailurePolicy,
) -> JoinHandle<()>
where
    I: WorkItem,
    A: RemoteAction<I>,
{
    tokio::spawn(async move {
        let _guard = WorkerGuard {
            events: events.clone(),
            worker_id,
        };

        loop {
            // The lock is only held while waiting for the next item.
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = async { items.lock().await.recv().await } => item,
            };
            let Some(item) = next else {
                break;
            };

            let outcome = apply(action.as_ref(), item).await;
            let failed = !outcome.is_success();

            if events.send(Event::Outcome(outcome)).is_err() {
                break;
            }
            if failed && policy == FailurePolicy::FailFast {
                debug!(worker_id, "Worker stopping after failure");
                break;
            }
        }
    })
}

/// Apply the action to one item, turning a panic into a failure
async fn apply<I, A>(action: &A, item: I) -> Outcome<I>
where
    I: WorkItem,
    A: RemoteAction<I>,
{
    let result = AssertUnwindSafe(action.apply(&item)).catch_unwind().await;

    match result {
        Ok(Ok(message)) => Outcome::Success { item, message },
        Ok(Err(error)) => Outcome::Failure { item, error },
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Outcome::Failure {
                item,
                error: format!("remote action panicked: {}", reason).into(),
            }
        }
    }
}
