//! Output module for run summaries and output inspection
//!
//! This module handles:
//! - The end-of-run summary (stdout and markdown report)
//! - Row counts and column fill rates of existing output targets

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use stats::{
    load_output_stats, print_output_stats, print_run_summary, OutputStats, RunSummary,
    ScopeSummary,
};
