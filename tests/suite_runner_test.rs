// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Suite Runner Integration Tests
 * Failure isolation, timeouts, ordering, cancellation and progress wiring
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::Mutex;
use serde_json::Map;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vector_suite::config::ScannerConfig;
use vector_suite::http_client::HttpClient;
use vector_suite::rate_limiter::{RateLimiterConfig, TargetRateLimiter};
use vector_suite::validation::{AllowAllPolicy, DenyListPolicy};
use vector_suite::{
    CancelToken, Finding, Probe, ProbeCategory, ProbeDescriptor, ProbeError, ProbeOutcome,
    ProbeRegistry, ProbeResult, ProgressStatus, ProgressTracker, Severity, SuiteError,
    SuiteRunner, SuiteRunnerOptions, SuiteStatus,
};
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

#[derive(Clone)]
enum Behaviour {
    Find(usize),
    Fail,
    Sleep(Duration),
    /// GET the target this many times
    Requests(usize),
}

struct StubProbe {
    name: String,
    target: String,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
    http: Arc<HttpClient>,
}

#[async_trait::async_trait]
impl Probe for StubProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Find(count) => Ok((0..*count)
                .map(|i| {
                    Finding::new(
                        "stub",
                        &self.name,
                        &self.target,
                        Severity::High,
                        format!("stub finding {}", i),
                        Map::new(),
                    )
                })
                .collect()),
            Behaviour::Fail => Err(ProbeError::Timeout {
                duration: Duration::from_secs(30),
            }),
            Behaviour::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
            Behaviour::Requests(count) => {
                for _ in 0..*count {
                    self.http.get(&self.target).await?;
                }
                Ok(Vec::new())
            }
        }
    }
}

fn stub(
    name: &str,
    category: ProbeCategory,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
) -> ProbeDescriptor {
    let owned = name.to_string();
    ProbeDescriptor::new(name, name, category, "stub probe", Severity::High, move |ctx| {
        Box::new(StubProbe {
            name: owned.clone(),
            target: ctx.target.clone(),
            behaviour: behaviour.clone(),
            calls: calls.clone(),
            http: ctx.http.clone(),
        })
    })
}

struct Harness {
    runner: SuiteRunner,
    tracker: Arc<ProgressTracker>,
    calls: Arc<AtomicUsize>,
}

fn harness(probes: Vec<(&str, Behaviour)>, options: SuiteRunnerOptions) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ProbeRegistry::new();
    for (name, behaviour) in probes {
        registry
            .register(stub(name, ProbeCategory::Owasp, behaviour, calls.clone()))
            .unwrap();
    }
    let tracker = Arc::new(ProgressTracker::new());
    let runner = SuiteRunner::new(
        Arc::new(registry),
        tracker.clone(),
        Arc::new(AllowAllPolicy),
        Arc::new(HttpClient::new(5, 0).unwrap()),
        options,
    );
    Harness {
        runner,
        tracker,
        calls,
    }
}

const TARGET: &str = "https://app.example.com";

#[tokio::test]
async fn test_failed_probe_is_isolated() {
    let h = harness(
        vec![
            ("sql", Behaviour::Find(2)),
            ("xss", Behaviour::Find(0)),
            ("auth", Behaviour::Fail),
        ],
        SuiteRunnerOptions::default(),
    );

    let result = h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();

    assert_eq!(result.total_probes, 3);
    assert_eq!(result.findings.len(), 2);
    assert_eq!(result.outcome("sql"), Some(&ProbeOutcome::Success { findings: 2 }));
    assert_eq!(result.outcome("xss"), Some(&ProbeOutcome::Success { findings: 0 }));
    assert!(matches!(result.outcome("auth"), Some(ProbeOutcome::Failed { .. })));
    assert_eq!(result.status, SuiteStatus::PartialFailure);
    assert!(result.suite_id.starts_with("suite_"));
    assert!(result.findings.iter().all(|f| f.target() == TARGET));
}

#[tokio::test]
async fn test_all_probes_failing_is_failed() {
    let h = harness(
        vec![("a", Behaviour::Fail), ("b", Behaviour::Fail)],
        SuiteRunnerOptions::default(),
    );
    let result = h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();
    assert_eq!(result.status, SuiteStatus::Failed);
    assert_eq!(result.failed_probes(), 2);
}

#[tokio::test]
async fn test_local_target_denied_before_any_probe() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ProbeRegistry::new();
    registry
        .register(stub("sql", ProbeCategory::Owasp, Behaviour::Find(1), calls.clone()))
        .unwrap();
    let tracker = Arc::new(ProgressTracker::new());
    let runner = SuiteRunner::new(
        Arc::new(registry),
        tracker.clone(),
        Arc::new(DenyListPolicy::default()),
        Arc::new(HttpClient::new(5, 0).unwrap()),
        SuiteRunnerOptions::default(),
    );

    let err = runner
        .run("http://localhost:8080", &ProbeCategory::Owasp)
        .await
        .unwrap_err();

    assert!(matches!(err, SuiteError::PermissionDenied { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(tracker.active().is_empty());
    assert!(tracker.completed().is_empty());
}

#[tokio::test]
async fn test_invalid_target_rejected() {
    let h = harness(vec![("sql", Behaviour::Find(1))], SuiteRunnerOptions::default());

    for target in ["", "not a url", "ftp://example.com"] {
        let err = h
            .runner
            .run(target, &ProbeCategory::Owasp)
            .await
            .unwrap_err();
        assert!(matches!(err, SuiteError::InvalidTarget { .. }), "{}", target);
    }
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_category_completes() {
    let h = harness(vec![("sql", Behaviour::Find(1))], SuiteRunnerOptions::default());

    let result = h
        .runner
        .run(TARGET, &ProbeCategory::Infrastructure)
        .await
        .unwrap();

    assert_eq!(result.total_probes, 0);
    assert!(result.findings.is_empty());
    assert_eq!(result.status, SuiteStatus::Completed);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_slow_probe_times_out() {
    let h = harness(
        vec![
            ("slow", Behaviour::Sleep(Duration::from_secs(10))),
            ("fast", Behaviour::Find(1)),
        ],
        SuiteRunnerOptions {
            max_concurrent_tests: 2,
            test_timeout: Duration::from_millis(100),
        },
    );

    let result = h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();

    match result.outcome("slow") {
        Some(ProbeOutcome::Failed { error }) => assert!(error.contains("timed out")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(result.outcome("fast"), Some(&ProbeOutcome::Success { findings: 1 }));
    assert_eq!(result.status, SuiteStatus::PartialFailure);
    assert!(result.duration_ms < 5_000);
}

#[tokio::test]
async fn test_results_keep_registration_order() {
    let h = harness(
        vec![
            ("first", Behaviour::Sleep(Duration::from_millis(120))),
            ("second", Behaviour::Sleep(Duration::from_millis(60))),
            ("third", Behaviour::Find(1)),
            ("fourth", Behaviour::Sleep(Duration::from_millis(10))),
        ],
        SuiteRunnerOptions {
            max_concurrent_tests: 4,
            test_timeout: Duration::from_secs(5),
        },
    );

    let result = h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();

    let names: Vec<_> = result
        .per_probe_status
        .iter()
        .map(|r| r.probe_name.as_str())
        .collect();
    assert_eq!(names, vec!["first", "second", "third", "fourth"]);
    assert_eq!(result.status, SuiteStatus::Completed);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let h = harness(
        vec![("sql", Behaviour::Find(1)), ("xss", Behaviour::Find(1))],
        SuiteRunnerOptions::default(),
    );
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = h
        .runner
        .run_with_cancel(TARGET, Some(&ProbeCategory::Owasp), &cancel)
        .await
        .unwrap();

    assert_eq!(result.status, SuiteStatus::Cancelled);
    assert!(result
        .per_probe_status
        .iter()
        .all(|r| r.outcome == ProbeOutcome::Cancelled));
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);

    let suite = h.tracker.get(&result.suite_id).unwrap();
    assert_eq!(suite.status, ProgressStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_during_run() {
    let h = harness(
        vec![("slow", Behaviour::Sleep(Duration::from_secs(10)))],
        SuiteRunnerOptions {
            max_concurrent_tests: 1,
            test_timeout: Duration::from_secs(30),
        },
    );
    let cancel = CancelToken::new();
    let trigger = cancel.clone();

    let (result, _) = tokio::join!(
        h.runner
            .run_with_cancel(TARGET, Some(&ProbeCategory::Owasp), &cancel),
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        }
    );
    let result = result.unwrap();

    assert_eq!(result.status, SuiteStatus::Cancelled);
    assert_eq!(result.outcome("slow"), Some(&ProbeOutcome::Cancelled));
    assert!(result.duration_ms < 5_000);
}

#[tokio::test]
async fn test_tracker_records_suite_and_probes() {
    let h = harness(
        vec![("sql", Behaviour::Find(2)), ("auth", Behaviour::Fail)],
        SuiteRunnerOptions::default(),
    );

    let result = h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();

    let suite = h.tracker.get(&result.suite_id).unwrap();
    assert_eq!(suite.status, ProgressStatus::Completed);
    assert_eq!(suite.total_steps, 2);
    assert_eq!(suite.completed_steps, 2);
    assert_eq!(suite.percent, 100.0);
    assert_eq!(suite.findings_count, 2);

    let sql = h.tracker.get(&format!("{}_sql", result.suite_id)).unwrap();
    assert_eq!(sql.status, ProgressStatus::Completed);
    assert_eq!(sql.findings_count, 2);

    let auth = h.tracker.get(&format!("{}_auth", result.suite_id)).unwrap();
    assert_eq!(auth.status, ProgressStatus::Failed);
    assert!(auth.error.is_some());

    assert!(h.tracker.active().is_empty());
}

#[tokio::test]
async fn test_observer_sees_monotonic_suite_progress() {
    let h = harness(
        vec![
            ("a", Behaviour::Find(1)),
            ("b", Behaviour::Find(0)),
            ("c", Behaviour::Sleep(Duration::from_millis(20))),
        ],
        SuiteRunnerOptions {
            max_concurrent_tests: 2,
            test_timeout: Duration::from_secs(5),
        },
    );
    let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.tracker.subscribe(move |record: &vector_suite::ProgressRecord| -> anyhow::Result<()> {
        // suite entries are `suite_<id>`, probe entries add `_<probe>`
        if record.id.matches('_').count() == 1 {
            sink.lock().push(record.percent);
        }
        Ok(())
    });

    h.runner.run(TARGET, &ProbeCategory::Owasp).await.unwrap();

    let seen = seen.lock();
    assert!(seen.len() >= 4);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(100.0));
}

#[tokio::test]
async fn test_run_all_spans_categories() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ProbeRegistry::new();
    registry
        .register(stub("sql", ProbeCategory::Owasp, Behaviour::Find(1), calls.clone()))
        .unwrap();
    registry
        .register(stub("chat", ProbeCategory::LlmAi, Behaviour::Find(1), calls.clone()))
        .unwrap();
    registry
        .register(stub(
            "ports",
            ProbeCategory::Infrastructure,
            Behaviour::Find(0),
            calls.clone(),
        ))
        .unwrap();
    let runner = SuiteRunner::new(
        Arc::new(registry),
        Arc::new(ProgressTracker::new()),
        Arc::new(AllowAllPolicy),
        Arc::new(HttpClient::new(5, 0).unwrap()),
        SuiteRunnerOptions::default(),
    );

    let result = runner.run_all(TARGET).await.unwrap();

    assert_eq!(result.total_probes, 3);
    assert_eq!(result.findings.len(), 2);
    assert_eq!(result.category, None);
    assert_eq!(result.category_label(), "all");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_builtin_registry_categories() {
    let registry = ProbeRegistry::with_builtin_probes().unwrap();
    assert_eq!(registry.get_by_category(&ProbeCategory::Owasp).len(), 10);
    assert_eq!(registry.get_by_category(&ProbeCategory::LlmAi).len(), 5);
    assert_eq!(registry.get_by_category(&ProbeCategory::Infrastructure).len(), 4);
    assert!(registry
        .get_by_category(&ProbeCategory::Custom("cloud".into()))
        .is_empty());
}

#[tokio::test]
async fn test_limiter_waits_do_not_count_against_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // One request up front, then one every 100ms
    let limiter = TargetRateLimiter::new(RateLimiterConfig {
        burst: Some(1),
        ..RateLimiterConfig::per_minute(600)
    });
    let http = HttpClient::new(5, 0)
        .unwrap()
        .with_rate_limiter(Arc::new(limiter));

    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ProbeRegistry::new();
    registry
        .register(stub("paced", ProbeCategory::Owasp, Behaviour::Requests(8), calls.clone()))
        .unwrap();
    let runner = SuiteRunner::new(
        Arc::new(registry),
        Arc::new(ProgressTracker::new()),
        Arc::new(AllowAllPolicy),
        Arc::new(http),
        SuiteRunnerOptions {
            max_concurrent_tests: 1,
            test_timeout: Duration::from_millis(300),
        },
    );

    let result = runner.run(&server.uri(), &ProbeCategory::Owasp).await.unwrap();

    assert_eq!(result.outcome("paced"), Some(&ProbeOutcome::Success { findings: 0 }));
    assert_eq!(result.status, SuiteStatus::Completed);
    assert!(result.duration_ms >= 600);
}

#[tokio::test]
async fn test_default_config_owasp_suite_completes_against_fast_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = ScannerConfig::default();
    let runner = SuiteRunner::from_config(
        &config,
        Arc::new(ProbeRegistry::with_builtin_probes().unwrap()),
        Arc::new(ProgressTracker::new()),
    )
    .unwrap()
    .with_policy(Arc::new(AllowAllPolicy));

    let result = runner.run(&server.uri(), &ProbeCategory::Owasp).await.unwrap();

    let failed: Vec<_> = result
        .per_probe_status
        .iter()
        .filter(|run| matches!(run.outcome, ProbeOutcome::Failed { .. }))
        .collect();
    assert!(failed.is_empty(), "{:?}", failed);
    assert_eq!(result.status, SuiteStatus::Completed);
}
