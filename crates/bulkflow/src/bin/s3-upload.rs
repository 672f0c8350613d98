use bulkflow::PipelineArgs;
use bulkflow_s3::{
    BucketStatus, DEFAULT_REGION, LocalFileSource, S3Config, S3Error, S3Uploader, UploadFile,
};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "s3-upload", version)]
#[command(about = "Upload a file or every file of a directory to an S3 bucket", long_about = None)]
struct Cli {
    /// Target bucket (created when missing)
    #[arg(long)]
    bucket: String,

    /// AWS shared config profile (default credential chain when unset)
    #[arg(long, alias = "config-profile", env = "AWS_PROFILE")]
    profile: Option<String>,

    /// File, or directory whose files are uploaded
    #[arg(long)]
    files: PathBuf,

    /// AWS region
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Key prefix for uploaded objects
    #[arg(long)]
    prefix: Option<String>,

    /// Also upload files in subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// S3-compatible endpoint (path-style addressing)
    #[arg(long, env = "AWS_ENDPOINT_URL_S3", hide = true)]
    endpoint_url: Option<String>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    bulkflow::init_tracing();

    let config = cli.pipeline.resolve()?;
    if !cli.files.exists() {
        return Err(S3Error::PathNotFound(cli.files).into());
    }

    let s3_config = S3Config::new(&cli.bucket, &cli.region)
        .with_profile(cli.profile)
        .with_endpoint_url(cli.endpoint_url);
    let uploader = S3Uploader::connect(&s3_config).await?;

    if !cli.pipeline.json {
        println!(
            "{}",
            format!("Uploading {} to s3://{}", cli.files.display(), cli.bucket)
                .yellow()
                .bold()
        );
        println!(
            "Region: {}  Workers: {}  Policy: {}",
            cli.region.cyan(),
            config.workers.to_string().cyan(),
            config.policy.to_string().cyan()
        );
    }

    let status = uploader.ensure_bucket().await?;
    if status == BucketStatus::Created && !cli.pipeline.json {
        println!("  ✓ Bucket {} created", cli.bucket.cyan());
    }

    let source = LocalFileSource::new(cli.files)
        .recursive(cli.recursive)
        .with_prefix(cli.prefix);
    let action = UploadFile::new(Arc::new(uploader));

    bulkflow::execute(source, action, &config, cli.pipeline.json).await
}
