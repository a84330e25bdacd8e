//! car-harvest main entry point
//!
//! This is the command-line interface for the car-harvest listing scraper.

use anyhow::Context;
use car_harvest::config::{load_config_with_hash, Config, OutputFormat};
use car_harvest::crawler::{build_scopes, run_crawl};
use car_harvest::output::{
    load_output_stats, print_output_stats, print_run_summary, write_markdown_summary,
};
use car_harvest::sink::output_path;
use car_harvest::SiteProfile;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// car-harvest: a resumable used-car listing scraper
///
/// car-harvest walks the listing pages of subito.it or autoscout24.de,
/// extracts a fixed set of fields from every detail page and appends them to
/// a CSV or SQLite output that later runs resume from.
#[derive(Parser, Debug)]
#[command(name = "car-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable used-car listing scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Walk every scope again, ignoring the checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the crawl scopes without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "fresh"])]
    dry_run: bool,

    /// Show row counts and column fill rates of existing outputs and exit
    #[arg(long, conflicts_with_all = ["dry_run", "fresh"])]
    stats: bool,

    /// Also write the run summary as markdown to this path
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export_summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, config_hash, cli.fresh, cli.export_summary).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("car_harvest=info,warn"),
            1 => EnvFilter::new("car_harvest=debug,info"),
            2 => EnvFilter::new("car_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and lists the crawl scopes
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let profile = SiteProfile::builtin(config.site.profile)?;
    let scopes = build_scopes(config).context("Failed to expand crawl scopes")?;

    println!("=== car-harvest Dry Run ===\n");

    println!("Site:");
    println!("  Profile: {} (rules {})", profile.name(), profile.rules.version);
    println!("  Base URL: {}", config.site.base_url);
    println!("  Columns: {}", profile.schema.columns.join(", "));

    println!("\nCrawler Configuration:");
    println!("  Max links per scope: {}", config.crawler.max_links);
    println!("  Max pages per scope: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.max_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Politeness delay: {}-{}ms",
        config.crawler.delay_min_ms, config.crawler.delay_max_ms
    );

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Format: {:?}", config.output.format);
    println!("  Checkpoint: {}", config.output.checkpoint_path);

    println!("\nCrawl Scopes ({}):", scopes.len());
    for scope in &scopes {
        println!(
            "  - {} -> {}",
            scope.id,
            output_path(&config.output.path, &scope.id).display()
        );
        println!("    * {}", scope.base_url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} scopes", scopes.len());

    Ok(())
}

/// Handles the --stats mode: inspects every output target of the configuration
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let profile = SiteProfile::builtin(config.site.profile)?;
    let scopes = build_scopes(config).context("Failed to expand crawl scopes")?;

    let mut seen = HashSet::new();
    let mut found = 0;

    for scope in &scopes {
        let path = output_path(&config.output.path, &scope.id);
        if !seen.insert(path.clone()) {
            continue;
        }

        let stats = load_output_stats(config.output.format, &path, profile.schema)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if let Some(stats) = stats {
            print_output_stats(&stats);
            found += 1;
        }
    }

    if found == 0 {
        let kind = match config.output.format {
            OutputFormat::Csv => "CSV",
            OutputFormat::Sqlite => "SQLite",
        };
        println!("No {} output found for {}", kind, config.output.path);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
    export_summary: Option<PathBuf>,
) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh run (ignoring checkpoint)");
    } else {
        tracing::info!("Starting run (resuming from checkpoint if present)");
    }

    let summary = run_crawl(config, config_hash, fresh)
        .await
        .context("Crawl failed")?;

    print_run_summary(&summary);

    if let Some(path) = export_summary {
        write_markdown_summary(&summary, &path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("\n✓ Summary exported to: {}", path.display());
    }

    Ok(())
}
