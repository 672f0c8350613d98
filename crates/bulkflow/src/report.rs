//! Final report printing and exit codes

use bulkflow_core::{
    FailurePolicy, FailureReport, PipelineError, PipelineResult, Report, Summary, WorkItem,
};
use chrono::Utc;
use colored::Colorize;

/// Exit code after an interrupt (128 + SIGINT)
pub const EXIT_INTERRUPTED: u8 = 130;

/// Serializable report for either way a run can end
pub fn build_report<I: WorkItem>(
    outcome: &Result<PipelineResult<I>, PipelineError>,
    policy: FailurePolicy,
) -> Report {
    match outcome {
        Ok(result) => result.report(policy),
        Err(err) => {
            let summary = match err {
                PipelineError::Aborted { summary, .. } => *summary,
                _ => Summary::default(),
            };
            let (failures, listing_error) = match err.root_cause() {
                PipelineError::Item { item, source } => (
                    vec![FailureReport {
                        item: item.clone(),
                        error: source.to_string(),
                    }],
                    None,
                ),
                PipelineError::Listing(e) => (Vec::new(), Some(e.to_string())),
                _ => (Vec::new(), None),
            };
            Report {
                policy,
                summary,
                failures,
                listing_error,
                aborted: true,
                finished_at: Utc::now(),
            }
        }
    }
}

/// Print the report to stdout, as text or JSON
pub fn print_report(report: &Report, error: Option<&PipelineError>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    if !report.failures.is_empty() {
        println!(
            "{}",
            format!("Failures ({}):", report.failures.len()).red().bold()
        );
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.item.cyan(), failure.error);
        }
    }
    if let Some(listing_error) = &report.listing_error {
        println!("{} {}", "Listing failed:".red().bold(), listing_error);
    }
    if let Some(err) = error {
        println!("{} {}", "✗ Aborted:".red().bold(), err);
    }

    let line = format!("{} ({})", report.summary, report.policy);
    if report.failures.is_empty() && report.listing_error.is_none() && !report.aborted {
        println!("{}", format!("✓ {}", line).green().bold());
    } else {
        println!("{}", format!("⚠ {}", line).yellow().bold());
    }
    Ok(())
}

/// Non-zero only when the run aborted
///
/// Best-effort runs exit zero even with failures; the report lists them.
pub fn exit_status<I>(outcome: &Result<PipelineResult<I>, PipelineError>) -> u8 {
    match outcome {
        Ok(result) if result.aborted => EXIT_INTERRUPTED,
        Ok(_) => 0,
        Err(err) if matches!(err.root_cause(), PipelineError::Cancelled) => EXIT_INTERRUPTED,
        Err(_) => 1,
    }
}
