//! Crawler coordinator - main run orchestration logic
//!
//! This module contains the main run loop, which:
//! - Expands the configured base URL into crawl scopes
//! - Skips scopes the checkpoint marks complete
//! - Walks each scope's listing pages and feeds the links to the pipeline
//! - Saves the checkpoint after every completed scope

use crate::config::Config;
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::frontier::{FrontierLimits, FrontierWalker, StopReason};
use crate::crawler::pipeline::RecordPipeline;
use crate::crawler::politeness::Politeness;
use crate::crawler::session::HttpSession;
use crate::extract::{FetchFailurePolicy, SiteProfile};
use crate::geo::{load_seed_file, select_zones};
use crate::output::{RunSummary, ScopeSummary};
use crate::sink::{open_sink, output_path, Sink};
use crate::state::Checkpoint;
use crate::url::{region_url, zone_url};
use crate::ScrapeError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Scope id used when the base URL has no placeholders
pub const DEFAULT_SCOPE: &str = "default";

/// One unit of work: a page-1 listing URL and the id it is checkpointed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    pub id: String,
    pub base_url: String,
}

/// Expands the configured base URL into crawl scopes
///
/// `{region}` yields one scope per configured region; `{lat}`/`{lon}`/`{zip}`
/// yield one scope per selected seed zone; otherwise there is a single
/// `default` scope.
pub fn build_scopes(config: &Config) -> Result<Vec<CrawlScope>, ScrapeError> {
    let template = &config.site.base_url;

    let candidates: Vec<CrawlScope> = if template.contains("{region}") {
        config
            .site
            .regions
            .iter()
            .map(|region| CrawlScope {
                id: region.clone(),
                base_url: region_url(template, region),
            })
            .collect()
    } else if let Some(geo) = &config.geo {
        let seeds = load_seed_file(Path::new(&geo.seed_path))?;
        select_zones(&seeds, geo.round_decimals, geo.min_distance_km, geo.limit)
            .into_iter()
            .map(|zone| CrawlScope {
                base_url: zone_url(template, &zone.id, zone.lat, zone.lon),
                id: zone.id,
            })
            .collect()
    } else {
        vec![CrawlScope {
            id: DEFAULT_SCOPE.to_string(),
            base_url: template.clone(),
        }]
    };

    let mut seen = HashSet::new();
    let scopes = candidates
        .into_iter()
        .filter(|scope| {
            let first = seen.insert(scope.id.clone());
            if !first {
                tracing::debug!("Dropping repeated scope {}", scope.id);
            }
            first
        })
        .collect();

    Ok(scopes)
}

/// Main coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    profile: Arc<SiteProfile>,
    fetcher: Arc<dyn Fetch>,
    fresh: bool,
}

impl Coordinator {
    /// Creates a coordinator that fetches over plain HTTP
    ///
    /// With `fresh` set, the checkpoint is ignored and every scope is walked
    /// again; the sinks still suppress rows that already exist.
    pub fn new(config: Config, config_hash: String, fresh: bool) -> Result<Self, ScrapeError> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config.crawler, &config.http)?);
        Self::with_fetcher(config, config_hash, fetcher, fresh)
    }

    /// Creates a coordinator around a custom fetch capability
    pub fn with_fetcher(
        config: Config,
        config_hash: String,
        fetcher: Arc<dyn Fetch>,
        fresh: bool,
    ) -> Result<Self, ScrapeError> {
        let profile = Arc::new(SiteProfile::builtin(config.site.profile)?);

        Ok(Self {
            config,
            config_hash,
            profile,
            fetcher,
            fresh,
        })
    }

    fn limits(&self) -> FrontierLimits {
        FrontierLimits {
            max_links: self.config.crawler.max_links,
            max_pages: self.config.crawler.max_pages,
            scroll_delay: Duration::from_millis(self.config.crawler.scroll_delay_ms),
            politeness: Politeness::from_config(&self.config.crawler),
        }
    }

    /// Runs every pending scope to completion
    pub async fn run(&self) -> Result<RunSummary, ScrapeError> {
        let scopes = build_scopes(&self.config)?;
        let checkpoint_path = PathBuf::from(&self.config.output.checkpoint_path);

        let mut checkpoint = if self.fresh {
            tracing::info!("Fresh run requested; ignoring checkpoint");
            Checkpoint::new(self.config_hash.clone())
        } else {
            Checkpoint::resume(&checkpoint_path, &self.config_hash)?
        };

        tracing::info!(
            "Starting {} run over {} scopes",
            self.profile.name(),
            scopes.len()
        );

        let pipeline = RecordPipeline::new(
            Arc::clone(&self.profile),
            Arc::clone(&self.fetcher),
            Politeness::from_config(&self.config.crawler),
            self.config.crawler.max_workers,
        );

        let mut summary = RunSummary::new(self.profile.name(), self.profile.rules.version);

        // Scopes sharing an output path share one sink and its key set
        let mut sinks: HashMap<PathBuf, Box<dyn Sink>> = HashMap::new();

        for scope in scopes {
            if checkpoint.is_completed(&scope.id) {
                tracing::info!("Scope {} already complete, skipping", scope.id);
                summary.scopes_resumed.push(scope.id);
                continue;
            }

            tracing::info!("Scope {}: {}", scope.id, scope.base_url);

            let walker = FrontierWalker::new(
                &self.profile,
                HttpSession::new(Arc::clone(&self.fetcher)),
                scope.base_url.as_str(),
                self.limits(),
            );
            let frontier = walker.walk().await;

            tracing::info!(
                "Scope {}: {} links from {} pages ({})",
                scope.id,
                frontier.links.len(),
                frontier.pages_visited,
                frontier.stop.as_str()
            );

            let path = output_path(&self.config.output.path, &scope.id);
            let sink = match sinks.remove(&path) {
                Some(sink) => sink,
                None => open_sink(self.config.output.format, &path, self.profile.schema)?,
            };

            let links_found = frontier.links.len();
            let (sink, report) = pipeline.run(frontier.links, sink).await?;
            sinks.insert(path, sink);

            summary.scopes.push(ScopeSummary {
                scope: scope.id.clone(),
                pages_visited: frontier.pages_visited,
                links_found,
                stop: frontier.stop,
                report,
            });

            if frontier.stop == StopReason::FetchFailed {
                tracing::warn!(
                    "Scope {} stopped at a failed listing page; leaving it pending",
                    scope.id
                );
                continue;
            }

            // Skipped detail pages are only retried while the scope stays pending
            if self.profile.on_fetch_error == FetchFailurePolicy::Skip && report.fetch_failures > 0
            {
                tracing::warn!(
                    "Scope {}: {} detail pages failed; leaving it pending",
                    scope.id,
                    report.fetch_failures
                );
                continue;
            }

            checkpoint.mark_completed(&scope.id);
            checkpoint.save(&checkpoint_path)?;
        }

        summary.finish();

        let totals = summary.totals();
        tracing::info!(
            "Run complete: {} rows written, {} already stored, {} fetch failures",
            totals.written,
            totals.skipped,
            totals.fetch_failures
        );

        Ok(summary)
    }
}

/// Runs a complete crawl with the plain-HTTP fetcher
pub async fn run_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
) -> Result<RunSummary, ScrapeError> {
    Coordinator::new(config, config_hash, fresh)?.run().await
}
