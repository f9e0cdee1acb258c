//! Record export as a pretty JSON array or newline-delimited JSON.

use clap::ValueEnum;
use meta_parser::ExtractedRecord;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Output encodings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One pretty-printed JSON array.
    Json,
    /// One compact JSON document per line.
    Ndjson,
}

impl OutputFormat {
    /// NDJSON for `.ndjson` and `.jsonl` paths, JSON otherwise.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ndjson") || ext.eq_ignore_ascii_case("jsonl") => {
                Self::Ndjson
            }
            _ => Self::Json,
        }
    }
}

/// Failure to persist records.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory could not be created.
    #[error("failed to create {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The output file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A record could not be encoded.
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes `records` to `path` in `format`, creating parent directories. An empty slice still
/// produces a valid document.
pub fn export_records(
    records: &[ExtractedRecord],
    path: &Path,
    format: OutputFormat,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(BufWriter::new(file), records, path, format)?;

    info!(count = records.len(), path = %path.display(), ?format, "exported records");
    Ok(())
}

fn write_records<W: Write>(
    mut writer: W,
    records: &[ExtractedRecord],
    path: &Path,
    format: OutputFormat,
) -> Result<(), ExportError> {
    let encoded = match format {
        OutputFormat::Json => write_json(&mut writer, records),
        OutputFormat::Ndjson => write_ndjson(&mut writer, records),
    };
    encoded.map_err(|err| classify(path, err))?;
    writer.flush().map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Encoder failures that originate in the sink become `Write`.
fn classify(path: &Path, err: serde_json::Error) -> ExportError {
    if err.is_io() {
        ExportError::Write {
            path: path.to_path_buf(),
            source: err.into(),
        }
    } else {
        ExportError::Encode(err)
    }
}

/// Pretty JSON array with two-space indentation and a trailing newline.
pub fn write_json<W: Write>(writer: &mut W, records: &[ExtractedRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

/// One compact JSON object per line.
pub fn write_ndjson<W: Write>(writer: &mut W, records: &[ExtractedRecord]) -> serde_json::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writeln!(writer).map_err(serde_json::Error::io)?;
    }
    Ok(())
}
