//! Listing sessions
//!
//! A session is the surface a frontier walker reads listing pages through.
//! Plain HTTP is the shipped implementation; a browser driver can implement
//! the same trait and add consent dismissal and scroll loading.

use crate::crawler::fetcher::Fetch;
use crate::ScrapeError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ListingSession: Send {
    /// Navigates to a listing page
    async fn open(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Dismisses a cookie/consent dialog if one is showing
    ///
    /// Returns true if a dialog was dismissed.
    async fn dismiss_consent(&mut self) -> Result<bool, ScrapeError> {
        Ok(false)
    }

    /// Current markup of the open page
    fn snapshot(&self) -> &str;

    /// Asks the page to load more content (for example by scrolling)
    ///
    /// Returns false if the session cannot load more.
    async fn load_more(&mut self) -> Result<bool, ScrapeError> {
        Ok(false)
    }
}

/// Session over a plain page fetcher; every page is a single static snapshot
pub struct HttpSession {
    fetcher: Arc<dyn Fetch>,
    body: String,
}

impl HttpSession {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            body: String::new(),
        }
    }
}

#[async_trait]
impl ListingSession for HttpSession {
    async fn open(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.body.clear();
        self.body = self.fetcher.fetch(url).await?;
        Ok(())
    }

    fn snapshot(&self) -> &str {
        &self.body
    }
}
