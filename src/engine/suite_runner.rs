// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Suite Runner
 * Runs the probes of one category against a target with failure isolation,
 * bounded concurrency, per-probe timeouts and cooperative cancellation.
 * Time a probe spends waiting on the rate limiter is not charged to its budget.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::config::ScannerConfig;
use crate::errors::{ProbeError, SuiteError};
use crate::http_client::HttpClient;
use crate::probes::ProbeContext;
use crate::progress::{ProgressTracker, ProgressUpdate};
use crate::rate_limiter::ThrottleClock;
use crate::registry::{ProbeDescriptor, ProbeRegistry};
use crate::types::{Finding, ProbeCategory, ProbeOutcome, ProbeRun, SuiteResult, SuiteStatus};
use crate::validation::{validate_target_syntax, DenyListPolicy, PolicyDecision, TargetPolicy};

#[derive(Debug, Clone)]
pub struct SuiteRunnerOptions {
    /// Probes in flight at once; 1 runs them strictly in sequence
    pub max_concurrent_tests: usize,
    /// Budget for one probe's `execute`, excluding rate limiter waits
    pub test_timeout: Duration,
}

impl Default for SuiteRunnerOptions {
    fn default() -> Self {
        Self {
            max_concurrent_tests: 5,
            test_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ScannerConfig> for SuiteRunnerOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            max_concurrent_tests: config.max_concurrent_tests,
            test_timeout: config.test_timeout(),
        }
    }
}

pub struct SuiteRunner {
    registry: Arc<ProbeRegistry>,
    tracker: Arc<ProgressTracker>,
    policy: Arc<dyn TargetPolicy>,
    http: Arc<HttpClient>,
    options: SuiteRunnerOptions,
}

impl SuiteRunner {
    pub fn new(
        registry: Arc<ProbeRegistry>,
        tracker: Arc<ProgressTracker>,
        policy: Arc<dyn TargetPolicy>,
        http: Arc<HttpClient>,
        options: SuiteRunnerOptions,
    ) -> Self {
        Self {
            registry,
            tracker,
            policy,
            http,
            options,
        }
    }

    /// Runner with the default deny-list policy and a rate-limited client
    pub fn from_config(
        config: &ScannerConfig,
        registry: Arc<ProbeRegistry>,
        tracker: Arc<ProgressTracker>,
    ) -> anyhow::Result<Self> {
        let http = HttpClient::from_config(config)?;
        Ok(Self::new(
            registry,
            tracker,
            Arc::new(DenyListPolicy::from_config(config)),
            Arc::new(http),
            SuiteRunnerOptions::from(config),
        ))
    }

    pub fn with_policy(mut self, policy: Arc<dyn TargetPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<ProbeRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn options(&self) -> &SuiteRunnerOptions {
        &self.options
    }

    /// Syntax check followed by the permission policy
    pub fn authorize(&self, target: &str) -> Result<(), SuiteError> {
        validate_target_syntax(target)?;
        match self.policy.check(target.trim()) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny { reason } => {
                warn!("Target {} denied: {}", target, reason);
                Err(SuiteError::PermissionDenied {
                    target: target.to_string(),
                    reason,
                })
            }
        }
    }

    pub async fn run(&self, target: &str, category: &ProbeCategory) -> Result<SuiteResult, SuiteError> {
        self.run_with_cancel(target, Some(category), &CancelToken::new())
            .await
    }

    /// Every registered probe regardless of category
    pub async fn run_all(&self, target: &str) -> Result<SuiteResult, SuiteError> {
        self.run_with_cancel(target, None, &CancelToken::new()).await
    }

    /// `category == None` selects every registered probe.
    ///
    /// Only an invalid or denied target (and tracker misuse) is an error. Probe
    /// failures, timeouts and cancellation are recorded in the result.
    pub async fn run_with_cancel(
        &self,
        target: &str,
        category: Option<&ProbeCategory>,
        cancel: &CancelToken,
    ) -> Result<SuiteResult, SuiteError> {
        self.authorize(target)?;
        let target = target.trim();

        let probes = match category {
            Some(category) => self.registry.get_by_category(category),
            None => self.registry.all(),
        };
        let label = category.map(|c| c.as_str().to_string()).unwrap_or_else(|| "all".to_string());

        let suite_id = format!("suite_{}", Uuid::new_v4().simple());
        let started_at = Utc::now();
        let clock = Instant::now();
        let total_probes = probes.len();

        info!(
            "Starting {} suite {} against {} ({} probes)",
            label, suite_id, target, total_probes
        );
        self.tracker.start(
            &suite_id,
            &format!("{} suite against {}", label, target),
            total_probes as u32,
        )?;

        let mut findings: Vec<Finding> = Vec::new();
        let mut runs: Vec<ProbeRun> = Vec::with_capacity(total_probes);
        let concurrency = self.options.max_concurrent_tests.max(1);

        let mut results = stream::iter(probes)
            .map(|descriptor| self.run_probe(&suite_id, descriptor, target, cancel))
            .buffered(concurrency);

        while let Some((run, probe_findings)) = results.next().await {
            findings.extend(probe_findings);
            self.tracker.update(
                &suite_id,
                ProgressUpdate::new()
                    .completed_steps(runs.len() as u32 + 1)
                    .step(run.probe_name.clone())
                    .findings(findings.len()),
            );
            runs.push(run);
        }
        // The stream borrows suite_id; release it before the id moves into the result
        drop(results);

        let status = SuiteStatus::from_runs(&runs);
        if status == SuiteStatus::Cancelled {
            self.tracker.cancel(&suite_id, "suite cancelled");
        } else {
            self.tracker.complete(&suite_id, findings.len(), None);
        }

        let duration_ms = clock.elapsed().as_millis() as u64;
        info!(
            "Suite {} finished: {:?}, {} findings in {}ms",
            suite_id,
            status,
            findings.len(),
            duration_ms
        );

        Ok(SuiteResult {
            suite_id,
            target: target.to_string(),
            category: category.cloned(),
            total_probes,
            findings,
            per_probe_status: runs,
            status,
            started_at,
            completed_at: Utc::now(),
            duration_ms,
        })
    }

    async fn run_probe(
        &self,
        suite_id: &str,
        descriptor: ProbeDescriptor,
        target: &str,
        cancel: &CancelToken,
    ) -> (ProbeRun, Vec<Finding>) {
        let progress_id = format!("{}_{}", suite_id, descriptor.name);
        if let Err(e) = self.tracker.start(&progress_id, &descriptor.display_name, 1) {
            warn!("Progress entry for {} not created: {}", descriptor.name, e);
        }

        let outcome_of = |outcome: ProbeOutcome| ProbeRun {
            probe_name: descriptor.name.clone(),
            outcome,
        };

        if cancel.is_cancelled() {
            self.tracker.cancel(&progress_id, "suite cancelled before start");
            return (outcome_of(ProbeOutcome::Cancelled), Vec::new());
        }

        let timeout = self.options.test_timeout;
        let throttle = ThrottleClock::new();
        let http = Arc::new(self.http.with_throttle_clock(throttle.clone()));
        let ctx = ProbeContext::new(target, http, timeout);
        let probe = descriptor.instantiate(ctx);
        self.tracker
            .update(&progress_id, ProgressUpdate::new().step("executing"));
        debug!("Running probe {} against {}", probe.name(), target);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            res = within_budget(probe.execute(), timeout, &throttle) => res,
        };

        match result {
            Ok(found) => {
                info!("Probe {} found {} issues", descriptor.name, found.len());
                self.tracker.complete(&progress_id, found.len(), None);
                (outcome_of(ProbeOutcome::Success { findings: found.len() }), found)
            }
            Err(ProbeError::Cancelled) => {
                info!("Probe {} cancelled", descriptor.name);
                self.tracker.cancel(&progress_id, "suite cancelled");
                (outcome_of(ProbeOutcome::Cancelled), Vec::new())
            }
            Err(e) => {
                warn!("Probe {} failed: {}", descriptor.name, e);
                let error = e.to_string();
                self.tracker.complete(&progress_id, 0, Some(error.clone()));
                (outcome_of(ProbeOutcome::Failed { error }), Vec::new())
            }
        }
    }
}

/// Re-check interval while a request is parked in the limiter
const THROTTLED_POLL: Duration = Duration::from_millis(50);

/// Run a probe until it finishes or has spent `budget` outside the limiter
async fn within_budget<F>(
    run: F,
    budget: Duration,
    throttle: &ThrottleClock,
) -> Result<Vec<Finding>, ProbeError>
where
    F: Future<Output = Result<Vec<Finding>, ProbeError>>,
{
    let started = tokio::time::Instant::now();
    tokio::pin!(run);

    loop {
        let deadline = started + budget + throttle.waited();
        let deadline = if throttle.is_throttled() {
            deadline.max(tokio::time::Instant::now() + THROTTLED_POLL)
        } else {
            deadline
        };

        tokio::select! {
            res = &mut run => return res,
            _ = tokio::time::sleep_until(deadline) => {
                let expired = started.elapsed() >= budget + throttle.waited();
                if expired && !throttle.is_throttled() {
                    return Err(ProbeError::Timeout { duration: budget });
                }
            }
        }
    }
}
