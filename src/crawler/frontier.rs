//! Frontier walker: paginated listing traversal
//!
//! The walker visits listing pages 1, 2, 3, ... of one crawl scope and
//! accumulates the detail links they contain. It stops at the first of:
//! - the link cap is reached
//! - the next page would exceed the page cap
//! - a page yields no link that was not seen before
//! - a listing page cannot be fetched

use crate::crawler::politeness::Politeness;
use crate::crawler::session::ListingSession;
use crate::extract::SiteProfile;
use crate::state::SessionState;
use crate::url::page_url;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Safety bound on load-more rounds for a single page
const MAX_LOAD_ROUNDS: u32 = 50;

/// Why a walker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    LinkCap,
    PageCap,
    Exhausted,
    FetchFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkCap => "link cap reached",
            Self::PageCap => "page cap reached",
            Self::Exhausted => "no new links",
            Self::FetchFailed => "listing fetch failed",
        }
    }
}

/// Limits and pacing of one walk
#[derive(Debug, Clone, Copy)]
pub struct FrontierLimits {
    pub max_links: usize,
    pub max_pages: u32,
    pub scroll_delay: Duration,
    pub politeness: Politeness,
}

/// Result of a finished walk
#[derive(Debug, Clone, PartialEq)]
pub struct Frontier {
    /// Unique ListingURLs in discovery order
    pub links: Vec<String>,
    pub pages_visited: u32,
    pub stop: StopReason,
}

/// Walks the listing pages of one crawl scope
pub struct FrontierWalker<'p, S> {
    profile: &'p SiteProfile,
    session: S,
    state: SessionState,
    base_url: String,
    limits: FrontierLimits,
    next_page: u32,
    seen: HashSet<String>,
    links: Vec<String>,
    stop: Option<StopReason>,
}

impl<'p, S: ListingSession> FrontierWalker<'p, S> {
    pub fn new(
        profile: &'p SiteProfile,
        session: S,
        base_url: impl Into<String>,
        limits: FrontierLimits,
    ) -> Self {
        Self {
            profile,
            session,
            state: SessionState::new(),
            base_url: base_url.into(),
            limits,
            next_page: 1,
            seen: HashSet::new(),
            links: Vec::new(),
            stop: None,
        }
    }

    /// Links accumulated so far, in discovery order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    /// Visits the next listing page
    ///
    /// Returns the links first seen on that page, or `None` once the walk has
    /// stopped. A page without new links ends the walk and returns `None`.
    pub async fn next_page(&mut self) -> Option<Vec<String>> {
        if self.stop.is_some() {
            return None;
        }

        if self.links.len() >= self.limits.max_links {
            return self.finish(StopReason::LinkCap);
        }

        if self.next_page > self.limits.max_pages {
            return self.finish(StopReason::PageCap);
        }

        let page = self.next_page;
        let url = match page_url(&self.base_url, self.profile.page_param, page) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build listing page {} of {}: {}", page, self.base_url, e);
                return self.finish(StopReason::FetchFailed);
            }
        };

        self.limits.politeness.wait().await;

        if let Err(e) = self.session.open(&url).await {
            tracing::warn!("Stopping at listing page {} ({}): {}", page, url, e);
            return self.finish(StopReason::FetchFailed);
        }
        self.state.record_page();
        self.next_page += 1;

        if self.state.needs_consent() {
            match self.session.dismiss_consent().await {
                Ok(true) => tracing::debug!("Consent dialog dismissed"),
                Ok(false) => {}
                Err(e) => tracing::debug!("Consent dismissal failed: {}", e),
            }
            self.state.mark_consent_handled();
        }

        let found = self.scan_stable(&url).await;
        let room = self.limits.max_links - self.links.len();

        let mut fresh = Vec::new();
        for link in found {
            if fresh.len() >= room {
                break;
            }
            if self.seen.insert(link.clone()) {
                fresh.push(link);
            }
        }

        tracing::info!(
            "Listing page {}: {} new links ({} total)",
            page,
            fresh.len(),
            self.links.len() + fresh.len()
        );

        if fresh.is_empty() {
            return self.finish(StopReason::Exhausted);
        }

        self.links.extend(fresh.iter().cloned());
        Some(fresh)
    }

    /// Drives the walk to completion
    pub async fn walk(mut self) -> Frontier {
        while self.next_page().await.is_some() {}

        Frontier {
            links: self.links,
            pages_visited: self.state.pages_opened,
            stop: self.stop.unwrap_or(StopReason::Exhausted),
        }
    }

    fn finish(&mut self, reason: StopReason) -> Option<Vec<String>> {
        tracing::debug!("Walk of {} stopped: {}", self.base_url, reason.as_str());
        self.stop = Some(reason);
        None
    }

    /// Scans the open page until its link count stops growing
    async fn scan_stable(&mut self, page: &str) -> Vec<String> {
        let Ok(page_url) = Url::parse(page) else {
            return Vec::new();
        };

        let mut links = self.profile.links.extract(self.session.snapshot(), &page_url);

        for _ in 0..MAX_LOAD_ROUNDS {
            match self.session.load_more().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tracing::debug!("Loading more of {} failed: {}", page, e);
                    break;
                }
            }

            if !self.limits.scroll_delay.is_zero() {
                tokio::time::sleep(self.limits.scroll_delay).await;
            }

            let rescanned = self.profile.links.extract(self.session.snapshot(), &page_url);
            if rescanned.len() <= links.len() {
                break;
            }
            links = rescanned;
        }

        links
    }
}
