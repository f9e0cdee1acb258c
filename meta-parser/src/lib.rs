//! Extract typed post records from OpenGraph-tagged HTML pages.
//!
//! This crate is the pure half of the scraper: it never touches the network. Given the text of a
//! fetched page it derives one [`ExtractedRecord`] through per-field fallback chains, mining
//! engagement counts from the rendered text and classifying links against a [`SiteProfile`].

#![warn(missing_docs)]

pub mod counts;
pub mod document;
pub mod extract;
pub mod record;
pub mod site;
pub mod timestamp;

pub use document::Document;
pub use extract::Extractor;
pub use record::{AuthorInfo, ExtractedRecord, MediaRef};
pub use site::SiteProfile;
pub use timestamp::{normalize, now_timestamp, CaptureClock, TimestampInput};

/// Extracts records from `html` with the default site profile and the system clock.
pub fn extract_records(url: &str, html: &str) -> Vec<ExtractedRecord> {
    Extractor::default().extract(url, html)
}
