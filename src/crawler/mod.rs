//! Crawler module for listing traversal and record harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetch`] capability
//! - Listing sessions and paginated frontier walking
//! - The bounded worker pool that fetches detail pages
//! - Overall run coordination and checkpointing

mod coordinator;
mod fetcher;
mod frontier;
mod pipeline;
mod politeness;
mod session;

pub use coordinator::{build_scopes, run_crawl, Coordinator, CrawlScope, DEFAULT_SCOPE};
pub use fetcher::{build_http_client, Fetch, HttpFetcher};
pub use frontier::{Frontier, FrontierLimits, FrontierWalker, StopReason};
pub use pipeline::{PipelineReport, RecordPipeline};
pub use politeness::Politeness;
pub use session::{HttpSession, ListingSession};
