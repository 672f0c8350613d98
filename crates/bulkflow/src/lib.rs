//! Shared plumbing of the `cf-purge-dns` and `s3-upload` tools

pub mod args;
pub mod report;

pub use args::PipelineArgs;

use bulkflow_core::{CancellationToken, PipelineConfig, RemoteAction, WorkSource};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout only carries the report
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

/// Run the pipeline until done or Ctrl-C, print the report and pick the exit code
pub async fn execute<S, A>(
    source: S,
    action: A,
    config: &PipelineConfig,
    json: bool,
) -> anyhow::Result<ExitCode>
where
    S: WorkSource,
    A: RemoteAction<S::Item>,
{
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, waiting for in-flight items to finish");
                cancel.cancel();
            }
        }
    });

    let outcome = bulkflow_core::run_until(source, action, config, cancel).await;
    interrupt.abort();

    let report = report::build_report(&outcome, config.policy);
    report::print_report(&report, outcome.as_ref().err(), json)?;
    Ok(ExitCode::from(report::exit_status(&outcome)))
}
