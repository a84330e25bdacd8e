//! Listing walks against a mock server

use crate::helpers::{detail_paths, subito_listing, NoQueryParam};
use car_harvest::config::ProfileKind;
use car_harvest::crawler::{
    Fetch, FrontierLimits, FrontierWalker, HttpFetcher, HttpSession, Politeness, StopReason,
};
use car_harvest::extract::SiteProfile;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/annunci-italia/vendita/auto/";

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn fetcher() -> Arc<dyn Fetch> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    Arc::new(HttpFetcher::new(client))
}

fn limits(max_links: usize, max_pages: u32) -> FrontierLimits {
    FrontierLimits {
        max_links,
        max_pages,
        scroll_delay: Duration::ZERO,
        politeness: Politeness::none(),
    }
}

async fn mount_listing(server: &MockServer, page: Option<&'static str>, paths: &[String], hits: u64) {
    let mock = Mock::given(method("GET")).and(path(LISTING));
    let mock = match page {
        None => mock.and(NoQueryParam("o")),
        Some(n) => mock.and(query_param("o", n)),
    };
    mock.respond_with(html(subito_listing(paths)))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walk_stops_on_page_without_new_links() {
    let server = MockServer::start().await;

    mount_listing(&server, None, &detail_paths(0..5), 1).await;
    mount_listing(&server, Some("2"), &detail_paths(5..10), 1).await;
    mount_listing(&server, Some("3"), &[], 1).await;
    mount_listing(&server, Some("4"), &detail_paths(10..15), 0).await;

    let profile = SiteProfile::builtin(ProfileKind::Subito).unwrap();
    let base = format!("{}{}", server.uri(), LISTING);
    let walker = FrontierWalker::new(&profile, HttpSession::new(fetcher()), base, limits(100, 10));

    let frontier = walker.walk().await;

    assert_eq!(frontier.links.len(), 10);
    assert_eq!(frontier.pages_visited, 3);
    assert_eq!(frontier.stop, StopReason::Exhausted);
    assert_eq!(
        frontier.links[0],
        format!("{}/auto/auto-usata-0.htm", server.uri())
    );
    // Tracking query stripped on the way in
    assert!(frontier.links.iter().all(|l| !l.contains('?')));
}

#[tokio::test]
async fn test_walk_respects_link_cap() {
    let server = MockServer::start().await;

    mount_listing(&server, None, &detail_paths(0..5), 1).await;
    mount_listing(&server, Some("2"), &detail_paths(5..10), 1).await;
    mount_listing(&server, Some("3"), &detail_paths(10..15), 0).await;

    let profile = SiteProfile::builtin(ProfileKind::Subito).unwrap();
    let base = format!("{}{}", server.uri(), LISTING);
    let walker = FrontierWalker::new(&profile, HttpSession::new(fetcher()), base, limits(7, 10));

    let frontier = walker.walk().await;

    assert_eq!(frontier.links.len(), 7);
    assert_eq!(frontier.stop, StopReason::LinkCap);
    assert_eq!(frontier.pages_visited, 2);
}

#[tokio::test]
async fn test_walk_stops_when_listing_page_fails() {
    let server = MockServer::start().await;

    mount_listing(&server, None, &detail_paths(0..5), 1).await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let profile = SiteProfile::builtin(ProfileKind::Subito).unwrap();
    let base = format!("{}{}", server.uri(), LISTING);
    let walker = FrontierWalker::new(&profile, HttpSession::new(fetcher()), base, limits(100, 10));

    let frontier = walker.walk().await;

    assert_eq!(frontier.links.len(), 5);
    assert_eq!(frontier.pages_visited, 1);
    assert_eq!(frontier.stop, StopReason::FetchFailed);
}

#[tokio::test]
async fn test_walk_ignores_foreign_and_non_detail_links() {
    let server = MockServer::start().await;

    let body = r#"<html><body>
          <a href="/auto/auto-usata-1.htm">ok</a>
          <a href="https://www.elsewhere.example/auto/auto-usata-2.htm">foreign</a>
          <a href="/annunci-italia/vendita/auto/?o=2">next</a>
          <a href="/auto/auto-usata-1.htm#foto">again</a>
          <a href="javascript:void(0)">js</a>
        </body></html>"#
        .to_string();
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(NoQueryParam("o"))
        .respond_with(html(body))
        .mount(&server)
        .await;

    let profile = SiteProfile::builtin(ProfileKind::Subito).unwrap();
    let base = format!("{}{}", server.uri(), LISTING);
    let walker = FrontierWalker::new(&profile, HttpSession::new(fetcher()), base, limits(100, 1));

    let frontier = walker.walk().await;

    assert_eq!(
        frontier.links,
        vec![format!("{}/auto/auto-usata-1.htm", server.uri())]
    );
    assert_eq!(frontier.stop, StopReason::PageCap);
}
