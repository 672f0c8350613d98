//! Pipeline entry points

use crate::action::RemoteAction;
use crate::aggregator::Aggregator;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::outcome::PipelineResult;
use crate::pool;
use crate::source::WorkSource;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Apply `action` to every item of `source` and wait for termination
///
/// Returns `Err(PipelineError::Configuration)` before any work starts if
/// `config` is invalid. Under fail-fast, the first item or listing failure
/// is returned as `Err(PipelineError::Aborted)`; under best-effort, all
/// failures are collected in the returned [`PipelineResult`].
pub async fn run<S, A>(
    source: S,
    action: A,
    config: &PipelineConfig,
) -> Result<PipelineResult<S::Item>>
where
    S: WorkSource,
    A: RemoteAction<S::Item>,
{
    run_until(source, action, config, CancellationToken::new()).await
}

/// Like [`run`], stopping dispatch when `cancel` fires
///
/// Cancellation is cooperative: in-flight actions run to completion and
/// are still counted.
pub async fn run_until<S, A>(
    source: S,
    action: A,
    config: &PipelineConfig,
    cancel: CancellationToken,
) -> Result<PipelineResult<S::Item>>
where
    S: WorkSource,
    A: RemoteAction<S::Item>,
{
    config.validate()?;

    info!(
        source = source.name(),
        workers = config.workers,
        policy = %config.policy,
        rate_limit = ?config.rate_limit,
        "Starting bulk operation"
    );

    let (item_tx, item_rx) = mpsc::channel(config.queue_capacity);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let item_rx = Arc::new(Mutex::new(item_rx));
    let action = Arc::new(action);

    let mut tasks = Vec::with_capacity(config.workers + 1);
    tasks.push(pool::spawn_producer(
        source,
        item_tx,
        event_tx.clone(),
        cancel.clone(),
        config.dispatch_interval(),
    ));
    for worker_id in 0..config.workers {
        tasks.push(pool::spawn_worker(
            worker_id,
            Arc::clone(&item_rx),
            Arc::clone(&action),
            event_tx.clone(),
            cancel.clone(),
            config.policy,
        ));
    }
    // Only the tasks hold senders from here on.
    drop(event_tx);

    let result = Aggregator::new(config.workers, config.policy, cancel)
        .run(event_rx)
        .await;

    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Pipeline task did not exit cleanly");
        }
    }

    result
}

/// Blocking form of [`run`] for callers outside an async runtime
///
/// Builds a multi-threaded tokio runtime for the duration of the run.
/// Must not be called from within a runtime.
pub fn run_blocking<S, A>(
    source: S,
    action: A,
    config: &PipelineConfig,
) -> Result<PipelineResult<S::Item>>
where
    S: WorkSource,
    A: RemoteAction<S::Item>,
{
    config.validate()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers.min(crate::config::default_workers()).max(1))
        .enable_all()
        .build()?;
    runtime.block_on(run(source, action, config))
}
