//! Flags shared by every tool

use bulkflow_config::Settings;
use bulkflow_core::{FailurePolicy, PipelineConfig};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Number of concurrent workers (default: available CPUs)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Failure policy: fail-fast or best-effort
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<FailurePolicy>,

    /// Maximum dispatches per second
    #[arg(long, value_name = "PER_SECOND")]
    pub rate_limit: Option<u32>,

    /// Settings file (default: BULKFLOW_CONFIG_PATH, ./bulkflow.yaml, ~/.config/bulkflow/config.yaml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl PipelineArgs {
    /// Load the settings file and resolve the pipeline configuration
    pub fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let settings = bulkflow_config::load(self.config.as_deref())?;
        let config = self.merge(&settings);
        config.validate()?;
        Ok(config)
    }

    /// Flags over settings over built-in defaults
    pub fn merge(&self, settings: &Settings) -> PipelineConfig {
        let mut config = settings.pipeline_config();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if self.rate_limit.is_some() {
            config.rate_limit = self.rate_limit;
        }
        config
    }
}
