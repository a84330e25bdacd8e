use crate::url::normalize_listing_url;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Detail-link matching for listing pages
#[derive(Debug, Clone)]
pub struct LinkRule {
    /// CSS selector of candidate anchors
    pub selector: &'static str,

    /// Pattern the path of a normalized link must match
    pub path_pattern: Regex,

    /// Only keep links on the listing page's own host
    pub same_host: bool,
}

impl LinkRule {
    pub fn new(selector: &'static str, path_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            selector,
            path_pattern: Regex::new(path_pattern)?,
            same_host: true,
        })
    }

    /// Extracts the detail links of one listing page
    ///
    /// Links are normalized (resolved, query and fragment stripped) before
    /// matching and returned in document order without repeats.
    pub fn extract(&self, body: &str, page_url: &Url) -> Vec<String> {
        let Ok(selector) = Selector::parse(self.selector) else {
            tracing::error!("Invalid link selector '{}'", self.selector);
            return Vec::new();
        };

        let document = Html::parse_document(body);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            let Ok(normalized) = normalize_listing_url(href, page_url) else {
                continue;
            };

            if self.matches(&normalized, page_url) && seen.insert(normalized.clone()) {
                links.push(normalized);
            }
        }

        links
    }

    fn matches(&self, link: &str, page_url: &Url) -> bool {
        let Ok(url) = Url::parse(link) else {
            return false;
        };

        if self.same_host && url.host_str() != page_url.host_str() {
            return false;
        }

        self.path_pattern.is_match(url.path())
    }
}
