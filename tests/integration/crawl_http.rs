//! End-to-end crawl tests over a mock HTTP site
//!
//! A wiremock server plays the per-site extraction endpoint: each page
//! URL returns a JSON array of records. The tests drive pagination
//! discovery and the full crawl runner against it.

use chrono::NaiveDate;
use sweepline::crawler::{CancelToken, CrawlRunner};
use sweepline::dedup::RecordDeduplicator;
use sweepline::output::RecordStore;
use sweepline::pagination::{DiscoveryOutcome, DiscoverySettings, PaginationDiscoverer};
use sweepline::probe::{build_probe_client, HttpProbe};
use sweepline::session::{CheckpointStore, ResumePolicy};
use sweepline::{Query, Record};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn records_json(bodies: &[&str]) -> String {
    let records: Vec<serde_json::Value> = bodies
        .iter()
        .map(|b| serde_json::json!({ "title": "Posting", "body": b }))
        .collect();
    serde_json::to_string(&records).unwrap()
}

/// Mounts one page of a category's result set
async fn mount_page(server: &MockServer, category: &str, subcategory: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/jobs/{}/{}", category, subcategory)))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/json"),
        )
        .mount(server)
        .await;
}

fn probe_for(server: &MockServer) -> HttpProbe {
    let client = build_probe_client("sweepline-test/1.0").unwrap();
    HttpProbe::new(
        client,
        format!("{}/jobs/{{category}}/{{subcategory}}?page={{page}}", server.uri()),
    )
}

fn settings() -> DiscoverySettings {
    DiscoverySettings {
        step: 2,
        ceiling: 6,
        probe_attempts: 3,
    }
}

const B1: &str = "Backend engineer wanted, Rust and distributed systems experience required";
const B2: &str = "Platform engineer wanted, Kubernetes and infrastructure automation focus";
const B3: &str = "Staff engineer wanted, storage internals and query planning background";
const B4: &str = "Site reliability engineer wanted, on-call rotation and observability stack";
const B5: &str = "Database engineer wanted, write-ahead logging and replication internals";
const SHARED: &str = "Senior generalist wanted, appears in several categories simultaneously";
const F1: &str = "Frontend engineer wanted, TypeScript and accessible component libraries";
const F2: &str = "Design systems engineer wanted, tokens and cross-platform theming work";
const F3: &str = "Web performance engineer wanted, profiling and bundle budget enforcement";

/// Backend: 3 valid pages of 2 records. Frontend: 2 valid pages, with
/// one body shared with backend.
async fn mount_site(server: &MockServer) {
    mount_page(server, "dev", "backend", 1, records_json(&[B1, B2])).await;
    mount_page(server, "dev", "backend", 2, records_json(&[B3, B4])).await;
    mount_page(server, "dev", "backend", 3, records_json(&[B5, SHARED])).await;
    mount_page(server, "dev", "backend", 4, "[]".to_string()).await;

    mount_page(server, "dev", "frontend", 1, records_json(&[SHARED, F1])).await;
    mount_page(server, "dev", "frontend", 2, records_json(&[F2, F3])).await;
    mount_page(server, "dev", "frontend", 3, "[]".to_string()).await;
    mount_page(server, "dev", "frontend", 4, "[]".to_string()).await;
}

#[tokio::test]
async fn test_discovery_over_http() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let probe = probe_for(&server);
    let discoverer = PaginationDiscoverer::new(&probe, settings());

    assert_eq!(
        discoverer.discover(&Query::new("dev", "backend")).await,
        DiscoveryOutcome::LastPage(3)
    );
    assert_eq!(
        discoverer.discover(&Query::new("dev", "frontend")).await,
        DiscoveryOutcome::LastPage(2)
    );
}

#[tokio::test]
async fn test_discovery_no_results_over_http() {
    let server = MockServer::start().await;
    mount_page(&server, "dev", "embedded", 1, "[]".to_string()).await;

    let probe = probe_for(&server);
    let discoverer = PaginationDiscoverer::new(&probe, settings());
    assert_eq!(
        discoverer.discover(&Query::new("dev", "embedded")).await,
        DiscoveryOutcome::NoResults
    );
}

#[tokio::test]
async fn test_discovery_survives_transient_server_errors() {
    let server = MockServer::start().await;

    // Page 1 fails twice before recovering; the retry budget covers it
    Mock::given(method("GET"))
        .and(path("/jobs/dev/backend"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "dev", "backend", 1, records_json(&[B1])).await;
    mount_page(&server, "dev", "backend", 2, "[]".to_string()).await;

    let probe = probe_for(&server);
    let discoverer = PaginationDiscoverer::new(&probe, settings());
    assert_eq!(
        discoverer.discover(&Query::new("dev", "backend")).await,
        DiscoveryOutcome::LastPage(1)
    );
}

#[tokio::test]
async fn test_full_crawl_session_over_http() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
    let records = RecordStore::open(dir.path().join("out")).unwrap();

    let queries = vec![Query::new("dev", "backend"), Query::new("dev", "frontend")];
    let mut runner = CrawlRunner::new(
        "mocksite",
        "mocksite",
        queries.clone(),
        probe_for(&server),
        settings(),
        checkpoints,
        records,
        RecordDeduplicator::new("mocksite", date),
        date,
        CancelToken::new(),
    );

    let summary = runner.run(ResumePolicy::Never).await.unwrap();
    assert_eq!(summary.queries_completed, 2);
    assert_eq!(summary.records_read, 10);
    assert!(!summary.aborted);

    // Checkpoint cleared on completion
    let checkpoints = CheckpointStore::open(dir.path().join("checkpoints")).unwrap();
    assert!(checkpoints.load("mocksite").is_none());

    // The shared body was admitted once, in the backend collection
    let records = RecordStore::open(dir.path().join("out")).unwrap();
    let backend: Vec<Record> = records
        .load(&records.collection_path("mocksite", &queries[0], date))
        .unwrap();
    let frontend: Vec<Record> = records
        .load(&records.collection_path("mocksite", &queries[1], date))
        .unwrap();
    assert_eq!(backend.len(), 6);
    assert_eq!(frontend.len(), 3);

    // Every stored record carries its assigned identity
    for record in backend.iter().chain(frontend.iter()) {
        assert!(record.id.is_some());
        assert!(record.fingerprint.is_some());
        assert_eq!(record.source.as_deref(), Some("mocksite"));
    }
}
