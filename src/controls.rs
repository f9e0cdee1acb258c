//! Command-line surface and the run controls resolved from it and the settings file.

use crate::export::OutputFormat;
use crate::fetcher::FetchConfig;
use crate::settings::Settings;
use clap::Parser;
use meta_parser::{timestamp, CaptureClock, SiteProfile};
use std::path::{Path, PathBuf};

/// Everything a run needs once the CLI and settings file are merged.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrapeControls {
    fetch: FetchConfig,
    site: SiteProfile,
    concurrency: usize,
    clock: CaptureClock,
    format: OutputFormat,
}

impl ScrapeControls {
    /// Constructs a new set of run controls.
    pub fn new(
        fetch: FetchConfig,
        site: SiteProfile,
        concurrency: usize,
        clock: CaptureClock,
        format: OutputFormat,
    ) -> Self {
        Self {
            fetch,
            site,
            concurrency: concurrency.max(1),
            clock,
            format,
        }
    }

    /// Retry, timeout and identity settings for the fetcher.
    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch
    }

    /// Site conventions used by the extractor.
    pub fn site_profile(&self) -> &SiteProfile {
        &self.site
    }

    /// Worker pool size.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Source of `captured_at`.
    pub fn capture_clock(&self) -> CaptureClock {
        self.clock
    }

    /// Encoding of the output file.
    pub fn output_format(&self) -> OutputFormat {
        self.format
    }
}

/// Command-line interface of the `metascrape` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "metascrape",
    version,
    about = "Scrape public post metadata into structured JSON"
)]
pub struct Cli {
    /// Text file with one URL per line; blank and '#' lines are skipped
    #[arg(long, env = "METASCRAPE_INPUT_FILE", default_value = "data/inputs.txt")]
    pub input_file: PathBuf,

    /// Where to write the extracted records
    #[arg(long, env = "METASCRAPE_OUTPUT_FILE", default_value = "data/output.json")]
    pub output_file: PathBuf,

    /// Settings JSON (request, scraper, proxy and site sections)
    #[arg(
        long,
        env = "METASCRAPE_CONFIG_FILE",
        default_value = "config/settings.json"
    )]
    pub config_file: PathBuf,

    /// Concurrent workers; scraper.concurrency in the settings file wins
    #[arg(long, env = "METASCRAPE_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Output encoding (inferred from the output extension when omitted)
    #[arg(long, env = "METASCRAPE_FORMAT", value_enum)]
    pub format: Option<OutputFormat>,

    /// Pin captured_at for every record (UNIX seconds or ISO-8601)
    #[arg(long, env = "METASCRAPE_CAPTURED_AT")]
    pub captured_at: Option<String>,

    /// Enable debug logging
    #[arg(long, env = "METASCRAPE_VERBOSE", default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Merges the parsed CLI with `settings` into `ScrapeControls`.
    pub fn build_controls(&self, settings: &Settings) -> ScrapeControls {
        ScrapeControls::new(
            settings.fetch_config(),
            settings.site_profile(),
            settings.concurrency(self.workers),
            self.capture_clock(),
            self.output_format(),
        )
    }

    /// Requested encoding, else the one implied by the output path.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::infer(&self.output_file))
    }

    /// Fixed clock when `--captured-at` is given, the system clock otherwise.
    pub fn capture_clock(&self) -> CaptureClock {
        match self.captured_at.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => CaptureClock::Fixed(timestamp::normalize(value)),
            _ => CaptureClock::System,
        }
    }

    /// Default `tracing` directive for this run; `RUST_LOG` overrides it.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "metascrape=debug,meta_parser=debug"
        } else {
            "metascrape=info,meta_parser=info"
        }
    }

    /// Path of the settings file.
    pub fn config_path(&self) -> &Path {
        &self.config_file
    }
}
