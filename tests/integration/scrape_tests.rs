//! Integration tests for incremental scraping
//!
//! These tests use wiremock to serve a listing page and its bulletins and run
//! the full cycle end-to-end against temporary state and output directories.

use openquake::config::{Config, RemoteConfig, RemoteKind};
use openquake::crawler::Coordinator;
use openquake::state::StateStore;
use openquake::{QuakeError, RunOutcome, RunSummary};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PERIOD: &str = "January 2023";

/// Builds a monthly listing page linking to the given record files
fn listing_page(records: &[&str]) -> String {
    let links: String = records
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"<tr><td><span><a href="2023_Earthquake_Information\January\{}">0{} January 2023 - 0{}:15 PM</a></span></td></tr>"#,
                name,
                i + 1,
                i + 1
            )
        })
        .collect();

    format!(
        r#"<html><body><div>
            <table class="MsoNormalTable"><tr><td>Earthquake Information</td></tr></table>
            <table class="MsoNormalTable"><tr><td><strong>{}</strong></td></tr></table>
            <table class="MsoNormalTable">{}</table>
        </div></body></html>"#,
        PERIOD, links
    )
}

/// Builds a well-formed bulletin page
fn bulletin_page(magnitude: &str) -> String {
    let row = |value: &str| format!("<tr><td>Label</td><td>{}</td></tr>", value);
    format!(
        r#"<html><body><table><tr><td>
            <table class="MsoNormalTable">{}{}{}{}{}</table>
            <table class="MsoNormalTable"><tr><td>Intensity</td><td>Intensity II - Davao City</td></tr></table>
            <table class="MsoNormalTable">{}{}{}{}</table>
        </td></tr></table></body></html>"#,
        row("01 Jan 2023 - 01:15:00 PM"),
        row("07.05°N, 126.60°E - 012 km S 20° E of Davao City"),
        row("010"),
        row("TECTONIC"),
        row(magnitude),
        row("No"),
        row("Yes"),
        row("01 January 2023 - 01:40 PM"),
        row("Analyst"),
    )
}

fn record_path(name: &str) -> String {
    format!("/2023_Earthquake_Information/January/{}", name)
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = server.uri();
    config.scraper.max_concurrency = Some(3);
    config.output.state_dir = dir.join("conf");
    config.output.output_dir = dir.join("data");
    config
}

async fn run(config: Config, listing_url: &str) -> Result<RunOutcome, QuakeError> {
    Coordinator::new(config)
        .await
        .expect("coordinator setup")
        .with_progress(false)
        .run(listing_url)
        .await
}

fn completed(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::NothingToScrape { period } => {
            panic!("expected a completed run, got nothing to scrape for {}", period)
        }
    }
}

fn read_state(dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("conf").join("January 2023.json"))
        .expect("state file written");
    serde_json::from_str(&content).expect("state file is JSON")
}

fn scraped_flags(state: &serde_json::Value) -> Vec<bool> {
    state
        .as_array()
        .expect("state is an array")
        .iter()
        .map(|t| t["scraped"].as_bool().expect("scraped flag"))
        .collect()
}

#[tokio::test]
async fn test_partial_failures_are_isolated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/EQLatest-Monthly/2023/2023_January.html", server.uri());

    mount_page(
        &server,
        "/EQLatest-Monthly/2023/2023_January.html",
        listing_page(&["a.html", "b.html", "c.html"]),
        1,
    )
    .await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;
    Mock::given(method("GET"))
        .and(path(record_path("b.html")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        &record_path("c.html"),
        "<html><body><p>Under maintenance</p></body></html>".to_string(),
        1,
    )
    .await;

    let summary = completed(
        run(create_test_config(&server, dir.path()), &listing_url)
            .await
            .unwrap(),
    );

    assert_eq!(summary.period, PERIOD);
    assert_eq!(summary.pending, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.new_items, 3);
    assert_eq!(
        summary.message(),
        "Process complete. Total 1/3 targets successfully scraped."
    );

    let output = summary.output.expect("one event was written");
    assert_eq!(output, dir.path().join("data").join("January 2023 - p01.parquet"));
    assert!(output.exists());

    let state = read_state(dir.path());
    assert_eq!(scraped_flags(&state), vec![true, false, false]);
}

#[tokio::test]
async fn test_state_file_contents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(&server, "/list.html", listing_page(&["a.html"]), 1).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("2.3"), 1).await;

    completed(
        run(create_test_config(&server, dir.path()), &listing_url)
            .await
            .unwrap(),
    );

    let state = read_state(dir.path());
    let entry = &state[0];
    assert_eq!(entry["label"], "01 January 2023 - 01:15 PM");
    assert_eq!(
        entry["url"],
        format!("{}{}", server.uri(), record_path("a.html"))
    );
    assert_eq!(entry["scraped"], true);
}

#[tokio::test]
async fn test_resume_fetches_only_unscraped_targets() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    // First run: b fails
    mount_page(&server, "/list.html", listing_page(&["a.html", "b.html"]), 1).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;
    Mock::given(method("GET"))
        .and(path(record_path("b.html")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let first = completed(
        run(create_test_config(&server, dir.path()), &listing_url)
            .await
            .unwrap(),
    );
    assert_eq!(first.succeeded, 1);
    server.verify().await;
    server.reset().await;

    // Second run: a new record c appears; a must not be fetched again
    mount_page(
        &server,
        "/list.html",
        listing_page(&["a.html", "b.html", "c.html"]),
        1,
    )
    .await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 0).await;
    mount_page(&server, &record_path("b.html"), bulletin_page("3.1"), 1).await;
    mount_page(&server, &record_path("c.html"), bulletin_page("1.9"), 1).await;

    let second = completed(
        run(create_test_config(&server, dir.path()), &listing_url)
            .await
            .unwrap(),
    );

    assert_eq!(second.pending, 2);
    assert_eq!(second.succeeded, 2);
    assert_eq!(second.new_items, 1);
    assert_eq!(
        second.output,
        Some(dir.path().join("data").join("January 2023 - p02.parquet"))
    );
    assert_eq!(scraped_flags(&read_state(dir.path())), vec![true, true, true]);
}

#[tokio::test]
async fn test_nothing_to_scrape() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(&server, "/list.html", listing_page(&["a.html"]), 2).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;

    completed(
        run(create_test_config(&server, dir.path()), &listing_url)
            .await
            .unwrap(),
    );
    let state_before = read_state(dir.path());

    let outcome = run(create_test_config(&server, dir.path()), &listing_url)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::NothingToScrape {
            period: PERIOD.to_string()
        }
    );
    assert_eq!(read_state(dir.path()), state_before);
    assert!(!dir
        .path()
        .join("data")
        .join("January 2023 - p02.parquet")
        .exists());
}

#[tokio::test]
async fn test_malformed_listing_writes_no_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(
        &server,
        "/list.html",
        "<html><body><p>No tables here</p></body></html>".to_string(),
        1,
    )
    .await;

    let result = run(create_test_config(&server, dir.path()), &listing_url).await;

    assert!(matches!(result, Err(QuakeError::Extraction(_))));
    assert!(!dir.path().join("conf").exists());
    assert!(!dir.path().join("data").exists());
}

#[tokio::test]
async fn test_listing_http_error_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/list.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = run(
        create_test_config(&server, dir.path()),
        &format!("{}/list.html", server.uri()),
    )
    .await;

    assert!(matches!(result, Err(QuakeError::Fetch(_))));
    assert!(!dir.path().join("conf").exists());
}

#[tokio::test]
async fn test_state_shared_through_remote_store() {
    let server = MockServer::start().await;
    let bucket = TempDir::new().unwrap();
    let first_machine = TempDir::new().unwrap();
    let second_machine = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(&server, "/list.html", listing_page(&["a.html"]), 2).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;

    let remote = RemoteConfig {
        kind: RemoteKind::Local,
        root: Some(bucket.path().to_path_buf()),
        bucket: None,
        region: None,
        endpoint: None,
        state_prefix: "conf".to_string(),
        output_prefix: "data".to_string(),
    };

    let mut config = create_test_config(&server, first_machine.path());
    config.remote = Some(remote.clone());
    completed(run(config, &listing_url).await.unwrap());

    assert!(bucket.path().join("conf").join("January 2023.json").exists());
    assert!(bucket
        .path()
        .join("data")
        .join("January 2023 - p01.parquet")
        .exists());

    // A run elsewhere picks up the remote state and finds nothing to do
    let mut config = create_test_config(&server, second_machine.path());
    config.remote = Some(remote);
    let outcome = run(config, &listing_url).await.unwrap();

    assert!(matches!(outcome, RunOutcome::NothingToScrape { .. }));
    let local = StateStore::new(second_machine.path().join("conf"));
    let saved = local.load(PERIOD).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].scraped);
}

#[tokio::test]
async fn test_output_failure_keeps_targets_pending() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(&server, "/list.html", listing_page(&["a.html"]), 1).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;

    // A regular file where the output directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.output.output_dir = blocker.join("data");

    let result = run(config, &listing_url).await;

    assert!(matches!(result, Err(QuakeError::Output(_))));
    assert_eq!(scraped_flags(&read_state(dir.path())), vec![false]);
}

#[tokio::test]
async fn test_second_machine_adds_a_new_part() {
    let server = MockServer::start().await;
    let bucket = TempDir::new().unwrap();
    let first_machine = TempDir::new().unwrap();
    let second_machine = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    let remote = RemoteConfig {
        kind: RemoteKind::Local,
        root: Some(bucket.path().to_path_buf()),
        bucket: None,
        region: None,
        endpoint: None,
        state_prefix: "conf".to_string(),
        output_prefix: "data".to_string(),
    };

    mount_page(&server, "/list.html", listing_page(&["a.html"]), 1).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 1).await;

    let mut config = create_test_config(&server, first_machine.path());
    config.remote = Some(remote.clone());
    completed(run(config, &listing_url).await.unwrap());

    server.verify().await;
    server.reset().await;

    // The month gains a record; the second machine only scrapes that one
    mount_page(&server, "/list.html", listing_page(&["a.html", "b.html"]), 1).await;
    mount_page(&server, &record_path("a.html"), bulletin_page("4.6"), 0).await;
    mount_page(&server, &record_path("b.html"), bulletin_page("3.2"), 1).await;

    let mut config = create_test_config(&server, second_machine.path());
    config.remote = Some(remote);
    let summary = completed(run(config, &listing_url).await.unwrap());

    assert_eq!(summary.pending, 1);
    assert_eq!(
        summary.output,
        Some(
            second_machine
                .path()
                .join("data")
                .join("January 2023 - p02.parquet")
        )
    );

    let shared = bucket.path().join("data");
    assert!(shared.join("January 2023 - p01.parquet").exists());
    assert!(shared.join("January 2023 - p02.parquet").exists());
    assert_ne!(
        std::fs::read(shared.join("January 2023 - p01.parquet")).unwrap(),
        std::fs::read(shared.join("January 2023 - p02.parquet")).unwrap()
    );
}

#[tokio::test]
async fn test_plan_uses_remote_state_without_writing_output() {
    let server = MockServer::start().await;
    let bucket = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let listing_url = format!("{}/list.html", server.uri());

    mount_page(&server, "/list.html", listing_page(&["a.html", "b.html"]), 1).await;

    // The shared store already knows a as scraped
    let seeded = TempDir::new().unwrap();
    let mut a = openquake::Target::new(
        "01 January 2023 - 01:15 PM",
        format!("{}{}", server.uri(), record_path("a.html")),
    );
    a.mark_scraped();
    StateStore::new(seeded.path())
        .with_remote(
            std::sync::Arc::new(openquake::storage::LocalObjectStore::new(bucket.path())),
            "conf",
        )
        .save(PERIOD, &[a])
        .await
        .unwrap();

    let mut config = create_test_config(&server, dir.path());
    config.remote = Some(RemoteConfig {
        kind: RemoteKind::Local,
        root: Some(bucket.path().to_path_buf()),
        bucket: None,
        region: None,
        endpoint: None,
        state_prefix: "conf".to_string(),
        output_prefix: "data".to_string(),
    });

    let plan = Coordinator::new(config)
        .await
        .unwrap()
        .with_progress(false)
        .plan(&listing_url)
        .await
        .unwrap();

    assert_eq!(plan.pending.len(), 1);
    assert_eq!(
        plan.pending[0].url,
        format!("{}{}", server.uri(), record_path("b.html"))
    );

    // Only the refreshed copy of the remote state lands locally
    let local = read_state(dir.path());
    assert_eq!(scraped_flags(&local), vec![true]);
    assert!(!dir.path().join("data").exists());
    assert!(!bucket.path().join("data").exists());
}
