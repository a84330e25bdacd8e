//! Markdown run report

use crate::output::stats::RunSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the run summary as a markdown report
pub fn write_markdown_summary(summary: &RunSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let totals = summary.totals();
    let mut md = String::new();

    md.push_str("# car-harvest Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Profile**: {}\n", summary.profile));
    md.push_str(&format!("- **Rules**: {}\n", summary.rules_version));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push('\n');

    md.push_str("## Totals\n\n");
    md.push_str(&format!("- **Links Queued**: {}\n", totals.queued));
    md.push_str(&format!("- **Already Stored**: {}\n", totals.skipped));
    md.push_str(&format!("- **Fetched**: {}\n", totals.fetched));
    md.push_str(&format!("- **Fetch Failures**: {}\n", totals.fetch_failures));
    md.push_str(&format!("- **Rows Written**: {}\n", totals.written));
    md.push_str(&format!("- **Duplicates**: {}\n", totals.duplicates));
    md.push_str(&format!("- **Dropped**: {}\n\n", totals.dropped));

    if !summary.scopes.is_empty() {
        md.push_str("## Scopes\n\n");
        md.push_str("| Scope | Pages | Links | Written | Failures | Stop |\n");
        md.push_str("|-------|-------|-------|---------|----------|------|\n");
        for scope in &summary.scopes {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                scope.scope,
                scope.pages_visited,
                scope.links_found,
                scope.report.written,
                scope.report.fetch_failures,
                scope.stop.as_str()
            ));
        }
        md.push('\n');
    }

    if !summary.scopes_resumed.is_empty() {
        md.push_str("## Completed Before This Run\n\n");
        for scope in &summary.scopes_resumed {
            md.push_str(&format!("- {}\n", scope));
        }
        md.push('\n');
    }

    md
}
