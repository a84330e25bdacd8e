//! Detail fetching and persistence against a mock server

use crate::helpers::{autoscout_detail, csv_rows, subito_detail};
use car_harvest::config::ProfileKind;
use car_harvest::crawler::{Fetch, HttpFetcher, Politeness, RecordPipeline};
use car_harvest::extract::{ListingRecord, SiteProfile, AUTOSCOUT24_SCHEMA, SUBITO_SCHEMA};
use car_harvest::sink::{CsvSink, Sink};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Arc<dyn Fetch> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    Arc::new(HttpFetcher::new(client))
}

fn pipeline(kind: ProfileKind, workers: usize) -> RecordPipeline {
    let profile = Arc::new(SiteProfile::builtin(kind).unwrap());
    RecordPipeline::new(profile, fetcher(), Politeness::none(), workers)
}

async fn mount_detail(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stored_urls_are_not_fetched_again() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("subito.csv");

    let url = |name: &str| format!("{}/auto/{}.htm", server.uri(), name);

    {
        let mut sink = CsvSink::open(&out, &SUBITO_SCHEMA).unwrap();
        sink.append(&ListingRecord::new(&SUBITO_SCHEMA, url("a"))).unwrap();
    }

    mount_detail(&server, "/auto/a.htm", subito_detail("A", "1 €", "1 km"), 0).await;
    mount_detail(&server, "/auto/b.htm", subito_detail("Fiat Punto", "4.500 €", "98000 km"), 1).await;
    mount_detail(&server, "/auto/c.htm", subito_detail("Lancia Ypsilon", "6.200 €", "51000 km"), 1).await;

    let sink = CsvSink::open(&out, &SUBITO_SCHEMA).unwrap();
    let (sink, report) = pipeline(ProfileKind::Subito, 2)
        .run(vec![url("a"), url("b"), url("c")], Box::new(sink))
        .await
        .unwrap();

    assert_eq!(report.queued, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.written, 2);
    assert_eq!(sink.len(), 3);
    drop(sink);

    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 3);
    let punto = rows.iter().find(|r| &r[0] == url("b")).unwrap();
    assert_eq!(&punto[1], "Fiat Punto");
    assert_eq!(&punto[2], "4.500 €");
    assert_eq!(&punto[4], "98000 km");
    assert_eq!(&punto[5], "Diesel");
}

#[tokio::test]
async fn test_failed_subito_detail_keeps_url_only_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("subito.csv");

    mount_detail(&server, "/auto/ok.htm", subito_detail("Fiat 500", "9.000 €", "30000 km"), 1).await;
    Mock::given(method("GET"))
        .and(path("/auto/gone.htm"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/auto/ok.htm", server.uri()),
        format!("{}/auto/gone.htm", server.uri()),
    ];

    let sink = CsvSink::open(&out, &SUBITO_SCHEMA).unwrap();
    let (_, report) = pipeline(ProfileKind::Subito, 4)
        .run(urls.clone(), Box::new(sink))
        .await
        .unwrap();

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.written, 2);

    let rows = csv_rows(&out);
    let gone = rows.iter().find(|r| &r[0] == urls[1]).unwrap();
    assert!(gone.iter().skip(1).all(|v| v.is_empty()));
}

#[tokio::test]
async fn test_autoscout24_details_from_payload() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("autoscout24.csv");

    mount_detail(&server, "/angebote/bmw-320d-1", autoscout_detail("BMW", "320d", "€ 17.900"), 1).await;
    // Expired listing: page loads but carries no payload
    mount_detail(&server, "/angebote/expired-2", "<html><body>Nicht verfügbar</body></html>".to_string(), 1).await;
    Mock::given(method("GET"))
        .and(path("/angebote/broken-3"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/angebote/bmw-320d-1", "/angebote/expired-2", "/angebote/broken-3"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();

    let sink = CsvSink::open(&out, &AUTOSCOUT24_SCHEMA).unwrap();
    let (sink, report) = pipeline(ProfileKind::Autoscout24, 3)
        .run(urls.clone(), Box::new(sink))
        .await
        .unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.fetch_failures, 1);
    assert!(sink.contains(&urls[0]));
    assert!(!sink.contains(&urls[2]));
    drop(sink);

    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(&row[0], "BMW 320d");
    assert_eq!(&row[1], "€ 17.900");
    assert_eq!(&row[2], "120500");
    assert_eq!(&row[3], "Diesel");
    assert_eq!(&row[4], "110");
    assert_eq!(&row[5], "");
    assert_eq!(&row[6], "11/2017");
    assert_eq!(&row[7], "Private");
    assert_eq!(&row[8], "Nichtraucher TÜV neu");
    assert_eq!(&row[9], urls[0]);
}
