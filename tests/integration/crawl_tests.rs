//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the fetch and ranking services
//! and run full crawls against a SQLite database in a temp directory.

use chrono::{Duration, Utc};
use costar_crawler::config::{
    BackoffConfig, BackoffTrigger, CollaboratorConfig, Config, CrawlerConfig, ModeConfig,
    OutputConfig, SeedConfig,
};
use costar_crawler::crawler::crawl;
use costar_crawler::state::{NodeKind, NodeStatus};
use costar_crawler::storage::{open_graph_store, EdgeMap};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration pointing both collaborators at `base_url`
fn create_test_config(base_url: &str, db_path: &Path, seeds: &[&str], max_rounds: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            parallel_workers: 2,
            freshness_days: 7,
            max_rounds,
            log_frequency: 1000,
            progress_symbols: false,
            costars_threshold: 2,
            retry_failed_after_days: None,
        },
        stars: ModeConfig { batch_size: 100 },
        gazers: ModeConfig { batch_size: 100 },
        backoff: BackoffConfig {
            duration_secs: 0,
            trigger: BackoffTrigger::AllExhausted,
        },
        collaborators: CollaboratorConfig {
            fetch_url: base_url.to_string(),
            rank_url: base_url.to_string(),
            timeout_secs: 5,
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
        seed: SeedConfig {
            nodes: seeds.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// Answers fetch requests from a fixed adjacency table
///
/// Sources missing from the table complete with no targets.
struct GraphResponder {
    targets: HashMap<&'static str, Vec<&'static str>>,
    totals: HashMap<&'static str, u64>,
}

impl GraphResponder {
    fn new() -> Self {
        Self {
            targets: HashMap::new(),
            totals: HashMap::new(),
        }
    }

    fn edge(mut self, source: &'static str, targets: &[&'static str]) -> Self {
        self.targets.insert(source, targets.to_vec());
        self
    }

    fn with_total(mut self, source: &'static str, total: u64) -> Self {
        self.totals.insert(source, total);
        self
    }
}

impl Respond for GraphResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };

        let events: Vec<Value> = body["sources"]
            .as_array()
            .map(|sources| {
                sources
                    .iter()
                    .filter_map(|s| s["source"].as_str())
                    .map(|source| {
                        let targets = self.targets.get(source).cloned().unwrap_or_default();
                        match self.totals.get(source) {
                            Some(total) => json!({
                                "kind": "complete",
                                "source": source,
                                "targets": targets,
                                "totalCount": total,
                            }),
                            None => json!({
                                "kind": "complete",
                                "source": source,
                                "targets": targets,
                            }),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(json!({
            "events": events,
            "queriesLeft": true,
        }))
    }
}

fn request_sources(request: &Request) -> Vec<Value> {
    serde_json::from_slice::<Value>(&request.body)
        .ok()
        .and_then(|body| body["sources"].as_array().cloned())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_full_crawl_to_completion() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    Mock::given(method("POST"))
        .and(path("/fetch/stars"))
        .respond_with(
            GraphResponder::new()
                .edge("alice", &["o/big", "o/small"])
                .edge("bob", &["o/big"]),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fetch/gazers"))
        .respond_with(
            GraphResponder::new()
                .edge("o/big", &["alice", "bob", "carol"])
                .edge("o/small", &["alice"])
                .with_total("o/big", 3),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/similar"))
        .and(query_param("repo", "o/big"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"repo": "o/other", "score": 0.9},
            {"repo": "o/small", "score": 0.4},
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path, &["alice"], 20);
    let summary = crawl(config).await.expect("Crawl should succeed");

    assert!(summary.completed);
    assert_eq!(summary.stars.succeeded, 3);
    assert_eq!(summary.gazers.succeeded, 2);
    assert_eq!(summary.stars.failed + summary.gazers.failed, 0);

    let store = open_graph_store(&db_path).unwrap();
    assert_eq!(
        store.get_edges(EdgeMap::Stars, "alice").unwrap(),
        vec!["o/big", "o/small"]
    );
    assert_eq!(
        store.get_edges(EdgeMap::Gazers, "o/big").unwrap(),
        vec!["alice", "bob", "carol"]
    );
    assert!(store.get_edges(EdgeMap::Stars, "carol").unwrap().is_empty());
    assert_eq!(store.get_num_gazers("o/big").unwrap(), Some(3));
    assert_eq!(store.get_num_gazers("o/small").unwrap(), Some(1));

    let costars = store.get_costars("o/big").unwrap().expect("costars stored");
    assert_eq!(costars.ranked.len(), 2);
    assert_eq!(costars.ranked[0].repo, "o/other");
    assert!(store.get_costars("o/small").unwrap().is_none());

    for id in ["alice", "bob", "carol", "o/big", "o/small"] {
        let status = store.get_status(id).unwrap().expect("status exists");
        assert!(status.last_pulled.is_some(), "{} should be pulled", id);
        assert!(!status.had_error);
    }
    assert_eq!(
        store.get_status("carol").unwrap().unwrap().kind,
        NodeKind::User
    );
}

#[tokio::test]
async fn test_rate_limited_sources_stay_eligible() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    Mock::given(method("POST"))
        .and(path("/fetch/stars"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path, &["alice"], 3);
    let summary = crawl(config).await.expect("Crawl should succeed");

    assert!(!summary.completed);
    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.backoffs, 2);
    assert_eq!(summary.stars.processed(), 0);

    let store = open_graph_store(&db_path).unwrap();
    let status = store.get_status("alice").unwrap().unwrap();
    assert!(status.is_pending());
    assert!(!status.had_error);
}

#[tokio::test]
async fn test_server_error_flags_chunk_as_failed() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    Mock::given(method("POST"))
        .and(path("/fetch/stars"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path, &["alice", "bob"], 10);
    let summary = crawl(config).await.expect("Crawl should succeed");

    // Failed nodes are not retried, so both directions run dry
    assert!(summary.completed);
    assert_eq!(summary.stars.failed, 2);

    let store = open_graph_store(&db_path).unwrap();
    for id in ["alice", "bob"] {
        let status = store.get_status(id).unwrap().unwrap();
        assert!(status.had_error);
        assert!(status.last_pulled.is_some());
    }

    assert_eq!(store.reset_errors(None).unwrap(), 2);
    assert!(store.get_status("alice").unwrap().unwrap().is_pending());
}

#[tokio::test]
async fn test_ranker_failure_keeps_source_successful() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    Mock::given(method("POST"))
        .and(path("/fetch/gazers"))
        .respond_with(
            GraphResponder::new()
                .edge("o/big", &["u1", "u2", "u3", "u4"])
                .with_total("o/big", 400),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/similar"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path, &["o/big"], 2);
    let summary = crawl(config).await.expect("Crawl should succeed");

    assert_eq!(summary.gazers.succeeded, 1);
    assert_eq!(summary.gazers.failed, 0);
    assert_eq!(summary.gazers.discovered, 4);

    let store = open_graph_store(&db_path).unwrap();
    assert_eq!(store.get_num_gazers("o/big").unwrap(), Some(400));
    assert!(store.get_costars("o/big").unwrap().is_none());
    assert!(!store.get_status("o/big").unwrap().unwrap().had_error);
}

#[tokio::test]
async fn test_stale_source_resumes_from_cursor() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    {
        let store = open_graph_store(&db_path).unwrap();
        let stale = Utc::now() - Duration::days(30);
        store
            .put_status("o/a", &NodeStatus::pulled(NodeKind::Repo, stale))
            .unwrap();
        store
            .put_edges(EdgeMap::Gazers, "o/a", &["u1".to_string(), "u2".to_string()])
            .unwrap();
    }

    Mock::given(method("POST"))
        .and(path("/fetch/gazers"))
        .respond_with(GraphResponder::new().edge("o/a", &["u2", "u3"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &db_path, &[], 2);
    let summary = crawl(config).await.expect("Crawl should succeed");
    assert_eq!(summary.gazers.succeeded, 1);

    let requests = mock_server.received_requests().await.unwrap();
    let gazer_request = requests
        .iter()
        .find(|r| r.url.path() == "/fetch/gazers")
        .expect("gazers fetch was sent");
    let sources = request_sources(gazer_request);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["source"], "o/a");
    assert_eq!(sources[0]["cursor"], "u2");

    let store = open_graph_store(&db_path).unwrap();
    assert_eq!(
        store.get_edges(EdgeMap::Gazers, "o/a").unwrap(),
        vec!["u1", "u2", "u3"]
    );
    // Discovery only covers fetched targets
    assert!(store.get_status("u1").unwrap().is_none());
    assert!(store.get_status("u3").unwrap().unwrap().is_pending());
}

#[tokio::test]
async fn test_second_run_skips_fresh_nodes() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");

    Mock::given(method("POST"))
        .and(path("/fetch/stars"))
        .respond_with(GraphResponder::new().edge("alice", &["o/a"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fetch/gazers"))
        .respond_with(GraphResponder::new().edge("o/a", &["alice"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let first = crawl(create_test_config(&mock_server.uri(), &db_path, &["alice"], 20))
        .await
        .unwrap();
    assert!(first.completed);

    let second = crawl(create_test_config(&mock_server.uri(), &db_path, &["alice"], 20))
        .await
        .unwrap();
    assert!(second.completed);
    assert_eq!(second.rounds, 2);
    assert_eq!(second.stars.processed() + second.gazers.processed(), 0);
}
