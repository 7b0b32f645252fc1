// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Contract
 * Async probe trait, the context a probe is bound to, and the built-in set
 *
 * Built-in probes are grouped by family:
 * - owasp: OWASP Top 10 heuristics
 * - llm: LLM/AI application attack surface
 * - infrastructure: ports, TLS, DNS and mail
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod infrastructure;
pub mod llm;
pub mod owasp;

use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::errors::{ProbeError, ProbeResult};
use crate::http_client::{HttpClient, HttpResponse};
use crate::registry::ProbeDescriptor;
use crate::types::{Finding, Severity};

/// One vulnerability check bound to a single target.
///
/// `execute` returns an empty list when nothing is found and an error only
/// for faults that make the check meaningless (the target is unreachable).
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self) -> ProbeResult<Vec<Finding>>;
}

/// Everything a probe instance is constructed with
#[derive(Clone)]
pub struct ProbeContext {
    pub target: String,
    pub http: Arc<HttpClient>,
    /// Budget for the whole probe run
    pub timeout: Duration,
}

impl ProbeContext {
    pub fn new(target: impl Into<String>, http: Arc<HttpClient>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            http,
            timeout,
        }
    }

    /// Target joined with an absolute path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.target.trim_end_matches('/'), path)
    }

    /// Target joined with a path plus url-encoded query parameters
    pub fn url_with_query(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = self.url(path);
        match Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut().extend_pairs(params);
                url.to_string()
            }
            Err(_) => base,
        }
    }

    pub fn host(&self) -> Option<String> {
        Url::parse(&self.target)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(|c| c == '[' || c == ']').to_string()))
    }

    /// First request of a probe. A transport failure here means the target is
    /// unreachable and is reported as a probe error.
    pub async fn baseline(&self) -> ProbeResult<HttpResponse> {
        self.http
            .get(&self.target)
            .await
            .map_err(ProbeError::from)
    }
}

/// Await a request, logging and discarding transport failures
pub async fn attempt<F>(label: &str, request: F) -> Option<HttpResponse>
where
    F: Future<Output = anyhow::Result<HttpResponse>>,
{
    match request.await {
        Ok(response) => Some(response),
        Err(e) => {
            debug!("{} request failed: {:#}", label, e);
            None
        }
    }
}

/// GET each path in order and return the first answering 200
pub async fn first_ok<I, S>(ctx: &ProbeContext, label: &str, paths: I) -> Option<(String, HttpResponse)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for path in paths {
        let path = path.as_ref();
        let url = ctx.url(path);
        if let Some(response) = attempt(label, ctx.http.get(&url)).await {
            if response.status_code == 200 {
                return Some((path.to_string(), response));
            }
        }
    }
    None
}

/// Accumulates findings for one probe run
pub struct FindingCollector {
    probe_name: String,
    target: String,
    findings: Vec<Finding>,
}

impl FindingCollector {
    pub fn new(ctx: &ProbeContext, probe_name: &str) -> Self {
        Self {
            probe_name: probe_name.to_string(),
            target: ctx.target.clone(),
            findings: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        test_type: &str,
        severity: Severity,
        description: impl Into<String>,
        evidence: Value,
    ) {
        let evidence = match evidence {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("detail".to_string(), other);
                map
            }
        };

        self.findings.push(Finding::new(
            test_type,
            &self.probe_name,
            &self.target,
            severity,
            description,
            evidence,
        ));
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn finish(self) -> Vec<Finding> {
        self.findings
    }
}

/// Case-insensitive: the first indicator contained in `body`
pub fn first_indicator<'a>(body: &str, indicators: &[&'a str]) -> Option<&'a str> {
    let lowered = body.to_lowercase();
    indicators
        .iter()
        .copied()
        .find(|indicator| lowered.contains(&indicator.to_lowercase()))
}

/// Shorten response bodies kept as evidence
pub fn excerpt(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let cut: String = body.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Every built-in probe in registration order
pub fn builtin_descriptors() -> Vec<ProbeDescriptor> {
    let mut descriptors = owasp::descriptors();
    descriptors.extend(llm::descriptors());
    descriptors.extend(infrastructure::descriptors());
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(target: &str) -> ProbeContext {
        let http = Arc::new(HttpClient::new(5, 0).unwrap());
        ProbeContext::new(target, http, Duration::from_secs(5))
    }

    #[test]
    fn test_url_joining() {
        let ctx = ctx("https://example.com/");
        assert_eq!(ctx.url("/api/users"), "https://example.com/api/users");

        let url = ctx.url_with_query("/api/search", &[("q", "<b>x</b>")]);
        assert!(url.starts_with("https://example.com/api/search?q="));
        assert!(!url.contains('<'));
    }

    #[test]
    fn test_host_extraction() {
        assert_eq!(ctx("http://10.1.2.3:8080").host().as_deref(), Some("10.1.2.3"));
        assert_eq!(ctx("http://[::1]:80/").host().as_deref(), Some("::1"));
    }

    #[test]
    fn test_first_indicator_is_case_insensitive() {
        let body = "Fatal: Warning: MYSQL_fetch_array() expects";
        assert_eq!(
            first_indicator(body, &["ORA-01756", "mysql_fetch"]),
            Some("mysql_fetch")
        );
        assert_eq!(first_indicator("all good", &["mysql_fetch"]), None);
    }

    #[test]
    fn test_collector_wraps_evidence() {
        let ctx = ctx("https://example.com");
        let mut collector = FindingCollector::new(&ctx, "owasp_sql_injection");
        collector.push(
            "sql_injection",
            Severity::High,
            "SQL error",
            serde_json::json!({"payload": "'"}),
        );
        collector.push("note", Severity::Info, "plain", serde_json::json!("text"));

        let findings = collector.finish();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].evidence()["payload"], "'");
        assert_eq!(findings[1].evidence()["detail"], "text");
        assert_eq!(findings[0].probe_name(), "owasp_sql_injection");
    }

    #[test]
    fn test_builtin_set_has_nineteen_unique_probes() {
        let descriptors = builtin_descriptors();
        assert_eq!(descriptors.len(), 19);

        let mut names: Vec<_> = descriptors.iter().map(|d| d.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 19);
    }
}
