//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured request metadata
//! - GET requests for listing and detail pages
//! - Error classification (timeout, transport, HTTP status)
//!
//! Failed requests are never retried within a run.

use crate::config::{CrawlerConfig, HttpConfig};
use crate::{ConfigError, ScrapeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;

/// Upper bound on connection setup, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Black-box page fetch capability
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url` and returns the response body
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use car_harvest::config::load_config;
/// use car_harvest::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("subito.toml")).unwrap();
/// let client = build_http_client(&config.crawler, &config.http).unwrap();
/// ```
pub fn build_http_client(crawler: &CrawlerConfig, http: &HttpConfig) -> Result<Client, ScrapeError> {
    let mut headers = HeaderMap::new();

    if let Some(language) = &http.accept_language {
        headers.insert(ACCEPT_LANGUAGE, header_value("accept-language", language)?);
    }

    if let Some(referer) = &http.referer {
        headers.insert(REFERER, header_value("referer", referer)?);
    }

    let timeout = Duration::from_secs(crawler.request_timeout_secs);

    let client = Client::builder()
        .user_agent(http.user_agent.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ScrapeError> {
    HeaderValue::from_str(value).map_err(|e| {
        ConfigError::Validation(format!("{} is not a valid header value: {}", name, e)).into()
    })
}

/// Plain-HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(crawler: &CrawlerConfig, http: &HttpConfig) -> Result<Self, ScrapeError> {
        Ok(Self::new(build_http_client(crawler, http)?))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> ScrapeError {
    if error.is_timeout() {
        ScrapeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ScrapeError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
