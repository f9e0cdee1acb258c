#![warn(missing_docs)]
//! Core library entry points for the metascrape scraper.
//!
//! Fetching, the worker pool and the I/O collaborators live here; record extraction is provided
//! by the `meta_parser` crate.

pub mod controls;
pub mod export;
pub mod fetcher;
pub mod input;
pub mod runtime;
pub mod settings;

pub use controls::{Cli, ScrapeControls};
pub use export::{export_records, ExportError, OutputFormat};
pub use fetcher::{
    FetchConfig, FetchError, Fetcher, HttpTransport, NoDocument, Transport, TransportError,
    TransportResponse, DEFAULT_USER_AGENT,
};
pub use input::read_input_urls;
pub use meta_parser::{ExtractedRecord, Extractor};
pub use runtime::{Orchestrator, RunReport, RunStats};
pub use settings::{Settings, SettingsError};
