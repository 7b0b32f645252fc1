// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP API Tests
 * Router served on an ephemeral port, probes aimed at a mocked target
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use vector_suite::api::{create_router, AppState};
use vector_suite::http_client::HttpClient;
use vector_suite::validation::{AllowAllPolicy, DenyListPolicy, TargetPolicy};
use vector_suite::{ProbeRegistry, ProgressTracker, SuiteRunner, SuiteRunnerOptions};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn spawn_api(policy: Arc<dyn TargetPolicy>) -> String {
    let registry = Arc::new(ProbeRegistry::with_builtin_probes().unwrap());
    let runner = SuiteRunner::new(
        registry,
        Arc::new(ProgressTracker::new()),
        policy,
        Arc::new(HttpClient::new(5, 0).unwrap()),
        SuiteRunnerOptions {
            max_concurrent_tests: 5,
            test_timeout: Duration::from_secs(20),
        },
    );
    let state = Arc::new(AppState::new(runner));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let api = spawn_api(Arc::new(AllowAllPolicy)).await;
    let body: Value = reqwest::get(format!("{}/health", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_probe_listing_and_lookup() {
    let api = spawn_api(Arc::new(AllowAllPolicy)).await;

    let body: Value = reqwest::get(format!("{}/probes", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 19);
    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories[0]["category"], "owasp");
    assert_eq!(categories[0]["probes"].as_array().unwrap().len(), 10);

    let probe = reqwest::get(format!("{}/probes/llm_data_poisoning", api))
        .await
        .unwrap();
    assert_eq!(probe.status(), 200);
    let probe: Value = probe.json().await.unwrap();
    assert_eq!(probe["category"], "llm");

    let missing = reqwest::get(format!("{}/probes/nope", api)).await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_run_llm_suite_and_fetch_report() {
    let target = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/llm/training-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
        .mount(&target)
        .await;

    let api = spawn_api(Arc::new(AllowAllPolicy)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/test/llm", api))
        .json(&json!({ "target_url": target.uri() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["category"], "llm");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["total_tests"], 5);
    assert_eq!(body["total_vulnerabilities"], 1);
    assert_eq!(body["summary"]["critical_count"], 1);
    assert_eq!(body["findings"][0]["probe_name"], "llm_data_poisoning");
    assert_eq!(body["test_results"].as_array().unwrap().len(), 5);

    let suite_id = body["suite_id"].as_str().unwrap();
    let progress: Value = client
        .get(format!("{}/progress/{}", api, suite_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["percent"], 100.0);

    let report_id = body["report_id"].as_str().unwrap();
    let markdown = client
        .get(format!("{}/reports/{}?format=markdown", api, report_id))
        .send()
        .await
        .unwrap();
    assert_eq!(markdown.status(), 200);
    assert!(markdown.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/markdown"));
    assert!(markdown.text().await.unwrap().contains("llm_data_poisoning"));

    let listing: Value = client
        .get(format!("{}/reports", api))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let bad_format = client
        .get(format!("{}/reports/{}?format=pdf", api, report_id))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_format.status(), 400);
}

#[tokio::test]
async fn test_missing_target_is_bad_request() {
    let api = spawn_api(Arc::new(AllowAllPolicy)).await;
    let response = reqwest::Client::new()
        .post(format!("{}/test/owasp", api))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "target_url is required");
}

#[tokio::test]
async fn test_invalid_target_is_bad_request() {
    let api = spawn_api(Arc::new(AllowAllPolicy)).await;
    let response = reqwest::Client::new()
        .post(format!("{}/test/owasp", api))
        .json(&json!({ "target_url": "ftp://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_denied_target_is_forbidden() {
    let api = spawn_api(Arc::new(DenyListPolicy::default())).await;
    let response = reqwest::Client::new()
        .post(format!("{}/test/owasp", api))
        .json(&json!({ "target_url": "http://127.0.0.1:9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_unknown_progress_and_report() {
    let api = spawn_api(Arc::new(AllowAllPolicy)).await;
    let progress = reqwest::get(format!("{}/progress/suite_missing", api))
        .await
        .unwrap();
    assert_eq!(progress.status(), 404);

    let report = reqwest::get(format!("{}/reports/report_missing", api))
        .await
        .unwrap();
    assert_eq!(report.status(), 404);

    let summary: Value = reqwest::get(format!("{}/progress", api))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["active_count"], 0);
}
