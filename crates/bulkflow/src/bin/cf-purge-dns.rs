use bulkflow::PipelineArgs;
use bulkflow_cloudflare::dns::{CLOUDFLARE_API_BASE, DEFAULT_PER_PAGE};
use bulkflow_cloudflare::{CloudflareDns, DeleteDnsRecord, DnsConfig, DnsRecordSource};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cf-purge-dns", version)]
#[command(about = "Delete every DNS record of a Cloudflare zone", long_about = None)]
struct Cli {
    /// Cloudflare API token (Bearer)
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    token: String,

    /// Zone whose records are deleted
    #[arg(long = "zone-id", alias = "zoneid", env = "CLOUDFLARE_ZONE_ID")]
    zone_id: String,

    /// Records per listing page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Only delete records of this type (A, AAAA, CNAME, TXT, ...)
    #[arg(long = "type", value_name = "TYPE")]
    record_type: Option<String>,

    /// List what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,

    /// Cloudflare API endpoint
    #[arg(long, env = "CLOUDFLARE_API_BASE", default_value = CLOUDFLARE_API_BASE, hide = true)]
    api_base: String,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    bulkflow::init_tracing();

    let config = cli.pipeline.resolve()?;
    let dns = Arc::new(CloudflareDns::new(
        DnsConfig::new(cli.token, cli.zone_id).with_api_base(cli.api_base),
    )?);

    if !cli.pipeline.json {
        let action = if cli.dry_run { "Listing" } else { "Purging" };
        println!(
            "{}",
            format!("{} DNS records of zone {}", action, dns.zone_id())
                .yellow()
                .bold()
        );
        if let Some(record_type) = &cli.record_type {
            println!("Type: {}", record_type.cyan());
        }
        println!(
            "Workers: {}  Policy: {}",
            config.workers.to_string().cyan(),
            config.policy.to_string().cyan()
        );
    }

    let source = DnsRecordSource::new(Arc::clone(&dns))
        .with_per_page(cli.per_page)
        .with_record_type(cli.record_type);
    let action = DeleteDnsRecord::new(dns).dry_run(cli.dry_run);

    bulkflow::execute(source, action, &config, cli.pipeline.json).await
}
