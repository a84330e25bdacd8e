//! Fetcher behaviour: request metadata and error classification

use car_harvest::config::{CrawlerConfig, HttpConfig};
use car_harvest::crawler::{Fetch, HttpFetcher};
use car_harvest::ScrapeError;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn configs(timeout_secs: u64) -> (CrawlerConfig, HttpConfig) {
    let crawler = CrawlerConfig {
        max_links: 100,
        max_pages: 10,
        max_workers: 2,
        request_timeout_secs: timeout_secs,
        delay_min_ms: 0,
        delay_max_ms: 0,
        scroll_delay_ms: 0,
    };
    let http = HttpConfig {
        user_agent: "car-harvest-test/1.0".to_string(),
        accept_language: Some("de-DE,de;q=0.9".to_string()),
        referer: Some("https://www.autoscout24.de/".to_string()),
    };
    (crawler, http)
}

#[tokio::test]
async fn test_fetch_sends_configured_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lst"))
        .and(header("user-agent", "car-harvest-test/1.0"))
        .and(header("accept-language", "de-DE,de;q=0.9"))
        .and(header("referer", "https://www.autoscout24.de/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let (crawler, http) = configs(5);
    let fetcher = HttpFetcher::from_config(&crawler, &http).unwrap();

    let body = fetcher.fetch(&format!("{}/lst", server.uri())).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/angebote/removed"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (crawler, http) = configs(5);
    let fetcher = HttpFetcher::from_config(&crawler, &http).unwrap();

    let err = fetcher
        .fetch(&format!("{}/angebote/removed", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_fetch_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (crawler, http) = configs(1);
    let fetcher = HttpFetcher::from_config(&crawler, &http).unwrap();

    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Timeout { .. }));
}
