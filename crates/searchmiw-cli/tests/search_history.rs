use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_session(dir: &std::path::Path) {
    fs::write(
        dir.join("session.json"),
        json!({"token": "abc", "userId": "1", "name": "U", "email": "u@x.com"}).to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_search_prints_results() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .and(body_partial_json(
            json!({"variables": {"query": "berlin", "language": "de"}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": {
                "query": "berlin",
                "results": [
                    {"id": "Q64", "title": "Berlin", "description": "Hauptstadt", "url": "https://www.wikidata.org/wiki/Q64"}
                ],
                "totalResults": 1,
                "searchTime": 12
            }}
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["search", "berlin", "--language", "de"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 results"))
        .stdout(predicate::str::contains("Berlin (Q64)"))
        .stdout(predicate::str::contains("https://www.wikidata.org/wiki/Q64"));
}

#[tokio::test]
async fn test_search_without_hits() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": {"query": "cat", "results": [], "totalResults": 0, "searchTime": 5}}
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["search", "cat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results for \"cat\"."));
}

#[tokio::test]
async fn test_search_uses_rest_when_configured() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[search]\ntransport = \"rest\"\n",
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("query", "cat"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"query": "cat", "results": []})))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["search", "cat"])
        .assert()
        .success();
}

#[tokio::test]
async fn test_history_list_prints_entries() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    write_session(dir.path());

    Mock::given(method("GET"))
        .and(path("/api/history/user/me"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "query": "rust", "timestamp": "2024-05-02T08:00:00"}
        ])))
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rust"))
        .stdout(predicate::str::contains("2024-05-02T08:00:00"));
}

#[test]
fn test_history_without_session_fails_locally() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", "http://127.0.0.1:1")
        .args(["history", "clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_stats_prints_daily_counts() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "historyEntries": [
                    {"id": 1, "timestamp": "2024-05-01T10:00:00"},
                    {"id": 2, "timestamp": "2024-05-01T12:00:00"}
                ],
                "users": []
            }
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Searches (line, total 2)"))
        .stdout(predicate::str::contains("2024-05-01  2"))
        .stdout(predicate::str::contains("Registrations (bar, total 0)"));
}

#[tokio::test]
async fn test_search_save_without_session_still_prints_results() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": {
                "query": "berlin",
                "results": [{"id": "Q64", "title": "Berlin"}],
                "totalResults": 1,
                "searchTime": 4
            }}
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["search", "berlin", "--save"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Berlin (Q64)"))
        .stderr(predicate::str::contains("Not logged in"));

    // The save was rejected locally; only the search reached the server.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_save_records_history() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    write_session(dir.path());

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": {"query": "cat", "results": [], "totalResults": 0}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/history/user/me"))
        .and(body_partial_json(json!({"query": "cat"})))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5, "query": "cat"})))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["search", "cat", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results for \"cat\"."))
        .stdout(predicate::str::contains("Saved to history"));
}

#[tokio::test]
async fn test_stats_json_output() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "historyEntries": [{"id": 1, "timestamp": "2024-05-01T10:00:00"}],
                "users": null
            }
        })))
        .mount(&server)
        .await;

    let output = cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["stats", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["searches"]["label"], "Searches");
    assert_eq!(stats["searches"]["kind"], "line");
    assert_eq!(stats["searches"]["dates"], json!(["2024-05-01"]));
    assert_eq!(stats["searches"]["counts"], json!([1]));
    assert_eq!(stats["registrations"]["kind"], "bar");
    assert_eq!(stats["registrations"]["dates"], json!([]));
}

#[tokio::test]
async fn test_history_json_output() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    write_session(dir.path());

    Mock::given(method("GET"))
        .and(path("/api/history/user/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"id": 3, "userId": 1, "query": "rust"}]
        })))
        .mount(&server)
        .await;

    let output = cargo_bin_cmd!("searchmiw")
        .env("SEARCHMIW_HOME", dir.path())
        .env("SEARCHMIW_BASE_URL", server.uri())
        .args(["--json", "history", "list", "--size", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page["size"], 5);
    assert_eq!(page["entries"][0]["id"], "3");
    assert_eq!(page["entries"][0]["userId"], "1");
    assert_eq!(page["entries"][0]["query"], "rust");
}
