//! Run summaries and output-file statistics
//!
//! This module provides the end-of-run summary and the `--stats` inspection
//! of existing output files.

use crate::config::OutputFormat;
use crate::crawler::{PipelineReport, StopReason};
use crate::extract::Schema;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Outcome of one crawl scope
#[derive(Debug, Clone)]
pub struct ScopeSummary {
    pub scope: String,
    pub pages_visited: u32,
    pub links_found: usize,
    pub stop: StopReason,
    pub report: PipelineReport,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub profile: &'static str,
    pub rules_version: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub scopes: Vec<ScopeSummary>,
    /// Scopes skipped because the checkpoint marks them complete
    pub scopes_resumed: Vec<String>,
}

impl RunSummary {
    pub fn new(profile: &'static str, rules_version: &'static str) -> Self {
        Self {
            profile,
            rules_version,
            started_at: Utc::now(),
            finished_at: None,
            scopes: Vec::new(),
            scopes_resumed: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Pipeline counters summed over all scopes
    pub fn totals(&self) -> PipelineReport {
        let mut total = PipelineReport::default();
        for scope in &self.scopes {
            total += scope.report;
        }
        total
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints the run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    let totals = summary.totals();

    println!("=== Run Summary ===\n");
    println!("Profile: {} (rules {})", summary.profile, summary.rules_version);
    if let Some(seconds) = summary.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
    println!();

    if !summary.scopes_resumed.is_empty() {
        println!(
            "Resumed: {} scopes already complete",
            summary.scopes_resumed.len()
        );
        println!();
    }

    println!("Scopes:");
    for scope in &summary.scopes {
        println!(
            "  {}: {} pages, {} links, {} new rows ({})",
            scope.scope,
            scope.pages_visited,
            scope.links_found,
            scope.report.written,
            scope.stop.as_str()
        );
    }
    println!();

    println!("Totals:");
    println!("  Links queued: {}", totals.queued);
    println!("  Already stored: {}", totals.skipped);
    println!("  Fetched: {}", totals.fetched);
    println!("  Fetch failures: {}", totals.fetch_failures);
    println!("  Rows written: {}", totals.written);
    if totals.duplicates > 0 {
        println!("  Duplicates: {}", totals.duplicates);
    }
    if totals.dropped > 0 {
        println!("  Dropped (empty): {}", totals.dropped);
    }
}

/// Row count and per-column fill of one output target
#[derive(Debug, Clone, PartialEq)]
pub struct OutputStats {
    pub target: String,
    pub rows: usize,
    /// Non-empty cells per schema column, in schema order
    pub filled: Vec<(&'static str, usize)>,
}

impl OutputStats {
    /// Fill rate of a column in percent
    pub fn fill_rate(&self, column: &str) -> Option<f64> {
        let (_, filled) = self.filled.iter().find(|(c, _)| *c == column)?;
        if self.rows == 0 {
            Some(0.0)
        } else {
            Some(*filled as f64 / self.rows as f64 * 100.0)
        }
    }
}

/// Computes statistics of an existing output target
///
/// Returns `Ok(None)` if the target does not exist yet.
pub fn load_output_stats(
    format: OutputFormat,
    path: &Path,
    schema: &'static Schema,
) -> Result<Option<OutputStats>, ScrapeError> {
    if !path.exists() {
        return Ok(None);
    }

    let stats = match format {
        OutputFormat::Csv => csv_stats(path, schema)?,
        OutputFormat::Sqlite => sqlite_stats(path, schema)?,
    };

    Ok(Some(stats))
}

fn csv_stats(path: &Path, schema: &'static Schema) -> Result<OutputStats, ScrapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(crate::sink::SinkError::from)?;
    let headers = reader.headers().map_err(crate::sink::SinkError::from)?.clone();

    let positions: Vec<Option<usize>> = schema
        .columns
        .iter()
        .map(|c| headers.iter().position(|h| h.trim() == *c))
        .collect();

    let mut rows = 0;
    let mut counts = vec![0usize; schema.columns.len()];

    for record in reader.records().flatten() {
        rows += 1;
        for (count, position) in counts.iter_mut().zip(&positions) {
            let filled = position
                .and_then(|p| record.get(p))
                .is_some_and(|v| !v.trim().is_empty());
            if filled {
                *count += 1;
            }
        }
    }

    Ok(OutputStats {
        target: path.display().to_string(),
        rows,
        filled: schema.columns.iter().copied().zip(counts).collect(),
    })
}

fn sqlite_stats(path: &Path, schema: &'static Schema) -> Result<OutputStats, ScrapeError> {
    let conn = rusqlite::Connection::open(path).map_err(crate::sink::SinkError::from)?;

    let counts: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("COUNT(NULLIF(TRIM(\"{}\"), ''))", c))
        .collect();
    let sql = format!(
        "SELECT COUNT(*), {} FROM \"{}\"",
        counts.join(", "),
        schema.name
    );

    let (rows, filled) = conn
        .query_row(&sql, [], |row| {
            let rows: i64 = row.get(0)?;
            let mut filled = Vec::with_capacity(schema.columns.len());
            for (i, column) in schema.columns.iter().enumerate() {
                let count: i64 = row.get(i + 1)?;
                filled.push((*column, count as usize));
            }
            Ok((rows as usize, filled))
        })
        .map_err(crate::sink::SinkError::from)?;

    Ok(OutputStats {
        target: format!("{} ({})", path.display(), schema.name),
        rows,
        filled,
    })
}

/// Prints output statistics to stdout
pub fn print_output_stats(stats: &OutputStats) {
    println!("=== {} ===", stats.target);
    println!("Rows: {}", stats.rows);
    println!("Column fill:");
    for (column, _) in &stats.filled {
        let rate = stats.fill_rate(column).unwrap_or(0.0);
        println!("  {:<24} {:>5.1}%", column, rate);
    }
    println!();
}
