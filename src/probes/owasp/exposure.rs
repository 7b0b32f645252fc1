// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Exposure Probes
 * Sensitive data in responses, known-vulnerable components and
 * insufficient logging/monitoring
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::errors::ProbeResult;
use crate::probes::{attempt, first_indicator, first_ok, FindingCollector, Probe, ProbeContext};
use crate::types::{Finding, Severity};

/// (label, pattern) pairs for unencrypted personal data
static SENSITIVE_DATA_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("credit_card", Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap()),
        ("ssn", Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (
            "email",
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
        ),
    ]
});

static VERSION_BANNERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Apache/\d+\.\d+",
        r"nginx/\d+\.\d+",
        r"PHP/\d+\.\d+",
        r"Python/\d+\.\d+",
        r"Node\.js/\d+\.\d+",
        r"Express/\d+\.\d+",
        r"Django/\d+\.\d+",
        r"Flask/\d+\.\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const DEBUG_MARKERS: &[&str] = &[
    "stack trace",
    "debug info",
    "internal error",
    "development mode",
    "test data",
];

const SENSITIVE_ERROR_MARKERS: &[&str] = &[
    "database connection",
    "password",
    "secret key",
    "internal server",
    "file path",
];

const VULNERABLE_COMPONENTS: &[&str] = &[
    "log4j",
    "struts",
    "spring",
    "jackson",
    "commons-collections",
];

pub(crate) const DEPENDENCY_MANIFESTS: &[&str] = &[
    "/package.json",
    "/requirements.txt",
    "/composer.json",
    "/pom.xml",
    "/build.gradle",
];

const LOG_INJECTION_PAYLOADS: &[&str] = &[
    "test\nadmin login successful",
    "test\r\nadmin login successful",
    "test%0Aadmin login successful",
    "test%0D%0Aadmin login successful",
];

const AUDIT_ENDPOINTS: &[&str] = &["/logs", "/audit", "/api/logs", "/admin/logs"];
const MONITORING_ENDPOINTS: &[&str] = &["/metrics", "/health", "/status", "/monitoring"];

pub struct SensitiveDataExposureProbe {
    ctx: ProbeContext,
}

impl SensitiveDataExposureProbe {
    pub const NAME: &'static str = "owasp_sensitive_data_exposure";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn unencrypted_data(&self, found: &mut FindingCollector) {
        let url = self.ctx.url("/api/users");
        let Some(response) = attempt("unencrypted_data", self.ctx.http.get(&url)).await else {
            return;
        };

        if let Some((label, pattern)) = SENSITIVE_DATA_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(&response.body))
        {
            found.push(
                "unencrypted_data",
                Severity::High,
                "Unencrypted sensitive data detected in response",
                json!({
                    "data_kind": label,
                    "pattern_matched": pattern.as_str(),
                    "response_status": response.status_code,
                }),
            );
        }
    }

    async fn marker_check(
        &self,
        path: &str,
        markers: &[&str],
        test_type: &str,
        description: &str,
        found: &mut FindingCollector,
    ) {
        let url = self.ctx.url(path);
        let Some(response) = attempt(test_type, self.ctx.http.get(&url)).await else {
            return;
        };

        if let Some(marker) = first_indicator(&response.body, markers) {
            found.push(
                test_type,
                Severity::Medium,
                description,
                json!({ "marker": marker, "response_status": response.status_code }),
            );
        }
    }
}

#[async_trait::async_trait]
impl Probe for SensitiveDataExposureProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        self.unencrypted_data(&mut found).await;
        self.marker_check(
            "/api/debug",
            DEBUG_MARKERS,
            "debug_information",
            "Debug information exposed in response",
            &mut found,
        )
        .await;
        self.marker_check(
            "/api/nonexistent",
            SENSITIVE_ERROR_MARKERS,
            "sensitive_error_messages",
            "Sensitive information in error messages",
            &mut found,
        )
        .await;

        Ok(found.finish())
    }
}

pub struct KnownVulnerabilitiesProbe {
    ctx: ProbeContext,
}

impl KnownVulnerabilitiesProbe {
    pub const NAME: &'static str = "owasp_known_vulnerabilities";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Probe for KnownVulnerabilitiesProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        let landing = self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        if let Some(banner) = VERSION_BANNERS
            .iter()
            .find_map(|pattern| pattern.find(&landing.body))
        {
            found.push(
                "version_disclosure",
                Severity::Low,
                "Version disclosure vulnerability detected",
                json!({ "banner": banner.as_str(), "response_status": landing.status_code }),
            );
        }

        if let Some(component) = first_indicator(&landing.body, VULNERABLE_COMPONENTS) {
            found.push(
                "cve_scanning",
                Severity::High,
                format!("Potentially vulnerable component detected: {}", component),
                json!({ "component": component, "response_status": landing.status_code }),
            );
        }

        if let Some((manifest, _)) =
            first_ok(&self.ctx, "dependency_check", DEPENDENCY_MANIFESTS).await
        {
            found.push(
                "dependency_check",
                Severity::Medium,
                format!("Dependency file exposed: {}", manifest),
                json!({ "dependency_file": manifest, "response_status": 200 }),
            );
        }

        Ok(found.finish())
    }
}

pub struct InsufficientLoggingProbe {
    ctx: ProbeContext,
}

impl InsufficientLoggingProbe {
    pub const NAME: &'static str = "owasp_insufficient_logging";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn log_injection(&self, found: &mut FindingCollector) {
        let url = self.ctx.url("/api/login");
        for payload in LOG_INJECTION_PAYLOADS {
            let body = json!({ "username": payload, "password": "test" });
            let Some(response) = attempt("log_injection", self.ctx.http.post_json(&url, &body)).await
            else {
                continue;
            };

            if response.status_code == 200 {
                found.push(
                    "log_injection",
                    Severity::Medium,
                    format!("Log injection vulnerability with payload: {:?}", payload),
                    json!({ "payload": payload, "response_status": response.status_code }),
                );
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl Probe for InsufficientLoggingProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        self.log_injection(&mut found).await;

        if let Some((endpoint, _)) = first_ok(&self.ctx, "audit_trail", AUDIT_ENDPOINTS).await {
            found.push(
                "audit_trail_check",
                Severity::Medium,
                format!("Audit trail exposed at {}", endpoint),
                json!({ "endpoint": endpoint, "response_status": 200 }),
            );
        }

        if let Some((endpoint, _)) =
            first_ok(&self.ctx, "monitoring_gaps", MONITORING_ENDPOINTS).await
        {
            found.push(
                "monitoring_gaps",
                Severity::Low,
                format!("Monitoring endpoint exposed at {}", endpoint),
                json!({ "endpoint": endpoint, "response_status": 200 }),
            );
        }

        Ok(found.finish())
    }
}
