//! BulkFlow core pipeline
//!
//! This crate applies one remote action to every item of a listing with
//! bounded parallelism, partial-failure visibility and deterministic
//! termination. Provider crates (Cloudflare, S3) plug in through the
//! [`WorkSource`] and [`RemoteAction`] traits.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  items   ┌──────────────────────┐ outcomes ┌──────────────┐
//! │  WorkSource  │ ───────▶ │  worker 0 .. W-1      │ ───────▶ │  Aggregator  │
//! │  (producer)  │  mpsc    │  RemoteAction::apply  │  mpsc    │ state machine│
//! └──────────────┘          └──────────────────────┘          └──────┬───────┘
//!         ▲                            ▲                             │
//!         └──── CancellationToken ─────┴──────── fail-fast ──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bulkflow_core::{FailurePolicy, PipelineConfig, VecSource, action_fn};
//!
//! let source = VecSource::new(vec!["a".to_string(), "b".to_string()]);
//! let action = action_fn(|item: &String| {
//!     let item = item.clone();
//!     async move { Ok(format!("{item} done")) }
//! });
//! let config = PipelineConfig::default().with_policy(FailurePolicy::BestEffort);
//!
//! let result = bulkflow_core::run(source, action, &config).await?;
//! println!("{}", result.summary());
//! ```

pub mod action;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod outcome;
pub mod pipeline;
mod pool;
pub mod source;

// Re-exports
pub use action::{ActionError, FnAction, RemoteAction, action_fn};
pub use aggregator::AggregatorState;
pub use config::{FailurePolicy, PipelineConfig};
pub use error::{ListingError, PipelineError, Result};
pub use outcome::{FailureReport, ItemFailure, Outcome, PipelineResult, Report, Summary};
pub use pipeline::{run, run_blocking, run_until};
pub use source::{VecSource, WorkItem, WorkSource};
pub use tokio_util::sync::CancellationToken;
