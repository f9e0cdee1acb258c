use anyhow::{Context, Result};
use clap::Parser;
use metascrape::{
    export_records, read_input_urls, Cli, Extractor, Fetcher, Orchestrator, Settings,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_directive());

    let settings = Settings::load(cli.config_path());
    let controls = cli.build_controls(&settings);

    let urls = read_input_urls(&cli.input_file)
        .with_context(|| format!("failed to read input file {:?}", cli.input_file))?;
    if urls.is_empty() {
        error!("no URLs to process, exiting");
        return Ok(());
    }

    let fetcher = Fetcher::http(controls.fetch_config().clone())
        .context("failed to build HTTP client")?;
    let extractor = Extractor::new(controls.site_profile().clone(), controls.capture_clock());
    let orchestrator = Orchestrator::new(fetcher, extractor, controls.concurrency());

    let report = orchestrator
        .run_blocking(urls)
        .context("failed to start async runtime")?;
    if report.records.is_empty() {
        warn!("no records were scraped, output will be empty");
    }

    export_records(&report.records, &cli.output_file, controls.output_format())
        .with_context(|| format!("failed to write output {:?}", cli.output_file))?;
    info!(
        path = %cli.output_file.display(),
        records = report.records.len(),
        "done"
    );
    Ok(())
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
