//! Resumable sinks for extracted records
//!
//! This module handles persistence of listing records:
//! - CSV files (default) and SQLite databases behind the [`Sink`] trait
//! - Loading the keys of an existing output before any work starts
//! - Durable writes, flushed and synced per record
//! - Per-scope output targets through the `{scope}` path placeholder

mod csv_sink;
mod sqlite_sink;
mod traits;

pub use csv_sink::CsvSink;
pub use sqlite_sink::SqliteSink;
pub use traits::{AppendOutcome, Sink, SinkError, SinkResult};

use crate::config::OutputFormat;
use crate::extract::Schema;
use std::path::{Path, PathBuf};

/// Resolves the output target of a crawl scope
///
/// Characters outside `[A-Za-z0-9_-]` in the scope id are replaced with `_`
/// so an id can never escape the configured directory.
///
/// # Examples
///
/// ```
/// use car_harvest::sink::output_path;
///
/// assert_eq!(output_path("out/subito_{scope}.csv", "emilia-romagna").to_str(), Some("out/subito_emilia-romagna.csv"));
/// assert_eq!(output_path("out/all.csv", "lazio").to_str(), Some("out/all.csv"));
/// ```
pub fn output_path(template: &str, scope: &str) -> PathBuf {
    let safe: String = scope
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    PathBuf::from(template.replace("{scope}", &safe))
}

/// Opens the configured sink backend at `path`
pub fn open_sink(
    format: OutputFormat,
    path: &Path,
    schema: &'static Schema,
) -> SinkResult<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::open(path, schema)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path, schema)?),
    };

    tracing::info!(
        "Output {} holds {} records",
        sink.describe(),
        sink.len()
    );

    Ok(sink)
}
