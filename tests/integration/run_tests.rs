//! Whole runs: walk, fetch, persist, checkpoint and resume

use crate::helpers::{
    autoscout_config, autoscout_detail, autoscout_listing, csv_rows, detail_paths, subito_config,
    subito_detail, subito_listing, NoQueryParam,
};
use car_harvest::config::OutputFormat;
use car_harvest::crawler::{Coordinator, StopReason};
use car_harvest::extract::SUBITO_SCHEMA;
use car_harvest::output::{load_output_stats, write_markdown_summary};
use car_harvest::state::Checkpoint;
use std::collections::HashSet;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/annunci-italia/vendita/auto/";

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Two listing pages of five links each, then an empty page
async fn mount_site(server: &MockServer, page_one_hits: u64) {
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(NoQueryParam("o"))
        .respond_with(html(subito_listing(&detail_paths(0..5))))
        .expect(page_one_hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "2"))
        .respond_with(html(subito_listing(&detail_paths(5..10))))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "3"))
        .respond_with(html(subito_listing(&[])))
        .expect(1)
        .mount(server)
        .await;

    // Every detail page is fetched exactly once across all runs
    for (i, detail) in detail_paths(0..10).iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(detail.as_str()))
            .respond_with(html(subito_detail(
                &format!("Auto {}", i),
                &format!("{}.000 €", i + 1),
                &format!("{}0000 km", i + 1),
            )))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_interrupted_run_resumes_without_refetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server, 2).await;

    // First run is cut short by the link cap
    let config = subito_config(&server.uri(), dir.path(), 5, 2);
    let summary = Coordinator::new(config, "first".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.scopes.len(), 1);
    assert_eq!(summary.scopes[0].stop, StopReason::LinkCap);
    assert_eq!(summary.totals().written, 5);

    let out = dir.path().join("subito_default.csv");
    assert_eq!(csv_rows(&out).len(), 5);

    // A changed configuration invalidates the checkpoint; the sink still dedups
    let config = subito_config(&server.uri(), dir.path(), 100, 3);
    let summary = Coordinator::new(config, "second".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    let totals = summary.totals();
    assert_eq!(summary.scopes[0].stop, StopReason::Exhausted);
    assert_eq!(summary.scopes[0].pages_visited, 3);
    assert_eq!(totals.queued, 10);
    assert_eq!(totals.skipped, 5);
    assert_eq!(totals.written, 5);

    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 10);
    let keys: HashSet<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(keys.len(), 10);

    let checkpoint = Checkpoint::load(&dir.path().join("checkpoint.json"))
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.config_hash, "second");
    assert!(checkpoint.is_completed("default"));

    // Same configuration again: the completed scope is not walked at all
    let config = subito_config(&server.uri(), dir.path(), 100, 3);
    let summary = Coordinator::new(config, "second".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.scopes.is_empty());
    assert_eq!(summary.scopes_resumed, vec!["default".to_string()]);
    assert_eq!(csv_rows(&out).len(), 10);

    let report = dir.path().join("summary.md");
    write_markdown_summary(&summary, &report).unwrap();
    assert!(std::fs::read_to_string(&report).unwrap().contains("- default"));

    let stats = load_output_stats(OutputFormat::Csv, &out, &SUBITO_SCHEMA)
        .unwrap()
        .unwrap();
    assert_eq!(stats.rows, 10);
    assert_eq!(stats.fill_rate("mileage"), Some(100.0));
    assert_eq!(stats.fill_rate("transmission"), Some(0.0));
}

#[tokio::test]
async fn test_unreachable_scope_stays_pending() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let config = subito_config(&server.uri(), dir.path(), 100, 2);
        let summary = Coordinator::new(config, "hash".to_string(), false)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(summary.scopes.len(), 1);
        assert_eq!(summary.scopes[0].stop, StopReason::FetchFailed);
        assert_eq!(summary.scopes[0].pages_visited, 0);
        assert!(summary.scopes_resumed.is_empty());
    }
}

#[tokio::test]
async fn test_scope_interrupted_mid_walk_is_resumed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(NoQueryParam("o"))
        .respond_with(html(subito_listing(&detail_paths(0..5))))
        .expect(2)
        .mount(&server)
        .await;
    // Page 2 fails once, then recovers
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "2"))
        .respond_with(html(subito_listing(&detail_paths(5..10))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param("o", "3"))
        .respond_with(html(subito_listing(&[])))
        .expect(1)
        .mount(&server)
        .await;
    for detail in detail_paths(0..10) {
        Mock::given(method("GET"))
            .and(path(detail.as_str()))
            .respond_with(html(subito_detail("Fiat Tipo", "7.000 €", "80000 km")))
            .expect(1)
            .mount(&server)
            .await;
    }

    let out = dir.path().join("subito_default.csv");
    let checkpoint_path = dir.path().join("checkpoint.json");

    let config = subito_config(&server.uri(), dir.path(), 100, 2);
    let summary = Coordinator::new(config, "h".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.scopes[0].stop, StopReason::FetchFailed);
    assert_eq!(summary.scopes[0].pages_visited, 1);
    assert_eq!(csv_rows(&out).len(), 5);
    let checkpoint = Checkpoint::load(&checkpoint_path).unwrap();
    assert!(!checkpoint.is_some_and(|c| c.is_completed("default")));

    let config = subito_config(&server.uri(), dir.path(), 100, 2);
    let summary = Coordinator::new(config, "h".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.scopes_resumed.is_empty());
    assert_eq!(summary.scopes[0].stop, StopReason::Exhausted);
    assert_eq!(summary.totals().skipped, 5);
    assert_eq!(summary.totals().written, 5);

    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 10);
    let keys: HashSet<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(keys.len(), 10);

    let checkpoint = Checkpoint::load(&checkpoint_path).unwrap().unwrap();
    assert!(checkpoint.is_completed("default"));
}

#[tokio::test]
async fn test_skipped_detail_pages_are_retried_next_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let listing = vec!["/angebote/audi-a4-1".to_string(), "/angebote/opel-astra-2".to_string()];

    Mock::given(method("GET"))
        .and(path("/lst"))
        .and(NoQueryParam("page"))
        .respond_with(html(autoscout_listing(&listing)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lst"))
        .and(query_param("page", "2"))
        .respond_with(html(autoscout_listing(&[])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/angebote/audi-a4-1"))
        .respond_with(html(autoscout_detail("Audi", "A4", "€ 21.500")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/angebote/opel-astra-2"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/angebote/opel-astra-2"))
        .respond_with(html(autoscout_detail("Opel", "Astra", "€ 9.990")))
        .expect(1)
        .mount(&server)
        .await;

    let out = dir.path().join("autoscout24.csv");

    let summary = Coordinator::new(autoscout_config(&server.uri(), dir.path()), "h".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.totals().fetch_failures, 1);
    assert_eq!(csv_rows(&out).len(), 1);

    let summary = Coordinator::new(autoscout_config(&server.uri(), dir.path()), "h".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.scopes_resumed.is_empty());
    assert_eq!(summary.totals().skipped, 1);
    assert_eq!(summary.totals().written, 1);

    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "Opel Astra");

    // Nothing left to retry: the scope is now complete
    let summary = Coordinator::new(autoscout_config(&server.uri(), dir.path()), "h".to_string(), false)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.scopes_resumed, vec!["default".to_string()]);
}
