// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Aggregator
 * Severity buckets and rule-based remediation advice for a suite result
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;

use crate::reporting::types::{Recommendation, Summary};
use crate::types::{ProbeCategory, Severity, SuiteResult};

/// (probe name, title, remediation)
const PROBE_REMEDIATIONS: &[(&str, &str, &str)] = &[
    ("owasp_sql_injection", "Implement Parameterized Queries",
     "Use parameterized queries or a query builder for every database access and never concatenate request input into SQL."),
    ("owasp_broken_authentication", "Harden Authentication",
     "Enforce a strong password policy, rate limit and lock out repeated login failures, and set HttpOnly, Secure and SameSite on session cookies."),
    ("owasp_sensitive_data_exposure", "Protect Sensitive Data",
     "Mask or remove personal and payment data from API responses, disable debug output and return generic error messages."),
    ("owasp_xml_external_entities", "Disable XML External Entities",
     "Disable DTD processing and external entity resolution in every XML parser, or accept JSON instead."),
    ("owasp_broken_access_control", "Enforce Server-Side Authorization",
     "Check object ownership and role on every request, deny by default and canonicalize file paths before use."),
    ("owasp_security_misconfiguration", "Harden Deployment Configuration",
     "Remove default accounts, disable directory listings and debug endpoints, and suppress version banners."),
    ("owasp_cross_site_scripting", "Implement Output Encoding",
     "Context-encode all untrusted output, avoid dangerous DOM sinks and deploy a restrictive Content-Security-Policy."),
    ("owasp_insecure_deserialization", "Avoid Native Deserialization of Untrusted Data",
     "Replace native object serialization with a data-only format and verify integrity of any serialized state."),
    ("owasp_known_vulnerabilities", "Update Vulnerable Components",
     "Inventory dependencies, upgrade components with known CVEs and stop serving dependency manifests."),
    ("owasp_insufficient_logging", "Secure Logging and Monitoring",
     "Neutralize control characters in logged input and restrict audit and monitoring endpoints to operators."),
    ("llm_prompt_injection", "Isolate Model Instructions",
     "Keep system instructions out of user-controllable context, filter model output and never expose the system prompt."),
    ("llm_data_poisoning", "Validate Training Data Sources",
     "Accept training data only from authenticated, trusted sources and review it before ingestion."),
    ("llm_model_theft", "Protect Model Artifacts",
     "Require authentication for model export endpoints and serve weights only to authorized infrastructure."),
    ("llm_supply_chain_vulnerabilities", "Audit the Model Supply Chain",
     "Pin and audit third-party packages and models, and do not publish dependency listings."),
    ("llm_insecure_output_handling", "Treat Model Output as Untrusted",
     "Encode or sanitize model output before rendering or evaluating it anywhere downstream."),
    ("infra_network_security", "Restrict Exposed Services",
     "Close or firewall service ports that do not need to be reachable from the tested network."),
    ("infra_ssl_tls_security", "Enforce Valid TLS",
     "Serve the application only over HTTPS with a certificate from a trusted authority and redirect plain HTTP."),
    ("infra_dns_security", "Review DNS Configuration",
     "Verify that the name resolves reliably and that published records do not reveal internal infrastructure."),
    ("infra_email_security", "Secure Mail Handling",
     "Reject CR/LF in mail header fields and publish SPF and DMARC policies for the domain."),
];

fn category_remediation(category: Option<&ProbeCategory>) -> (&'static str, &'static str) {
    match category {
        Some(ProbeCategory::Owasp) => (
            "Address OWASP Top 10 Weaknesses",
            "Review the affected endpoints against the OWASP Application Security Verification Standard.",
        ),
        Some(ProbeCategory::LlmAi) => (
            "Secure the LLM Integration",
            "Review the model integration against the OWASP Top 10 for LLM Applications.",
        ),
        Some(ProbeCategory::Infrastructure) => (
            "Harden Infrastructure",
            "Review network exposure, transport security and DNS configuration of the host.",
        ),
        Some(ProbeCategory::Custom(_)) | None => (
            "Investigate Reported Issues",
            "Triage the reported findings and apply the fix appropriate to each affected component.",
        ),
    }
}

pub struct ReportAggregator;

impl ReportAggregator {
    pub fn summarize(result: &SuiteResult) -> Summary {
        let mut summary = Summary {
            total: result.findings.len(),
            ..Default::default()
        };

        for finding in &result.findings {
            match finding.severity() {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
                Severity::Info => summary.info_count += 1,
            }
        }

        summary
    }

    /// One entry per non-empty severity bucket (most severe first), then one per
    /// probe that reported findings, in order of first appearance.
    pub fn recommend(result: &SuiteResult, summary: &Summary) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for severity in Severity::ALL {
            let count = summary.count(severity);
            if count == 0 {
                continue;
            }
            let (title, description) = match severity {
                Severity::Critical => (
                    "Address Critical Vulnerabilities Immediately",
                    format!("Found {} critical vulnerabilities that require immediate attention", count),
                ),
                Severity::High => (
                    "Implement High-Priority Security Measures",
                    format!("Address {} high-severity vulnerabilities promptly", count),
                ),
                Severity::Medium => (
                    "Plan Remediation of Medium-Severity Issues",
                    format!("Schedule fixes for {} medium-severity vulnerabilities", count),
                ),
                Severity::Low => (
                    "Review Low-Severity Issues",
                    format!("Review {} low-severity findings during regular maintenance", count),
                ),
                Severity::Info => (
                    "Review Informational Findings",
                    format!("{} informational findings were recorded", count),
                ),
            };
            recommendations.push(Recommendation {
                priority: severity,
                title: title.to_string(),
                description,
            });
        }

        // probe name -> (count, most severe)
        let mut order: Vec<&str> = Vec::new();
        let mut per_probe: HashMap<&str, (usize, Severity)> = HashMap::new();
        for finding in &result.findings {
            let entry = per_probe.entry(finding.probe_name()).or_insert_with(|| {
                order.push(finding.probe_name());
                (0, finding.severity())
            });
            entry.0 += 1;
            if finding.severity().rank() < entry.1.rank() {
                entry.1 = finding.severity();
            }
        }

        for name in order {
            let (count, priority) = per_probe[name];
            let (title, remediation) = Self::remediation_for(name, result.category.as_ref());
            recommendations.push(Recommendation {
                priority,
                title: title.to_string(),
                description: format!("{} finding(s) from {}: {}", count, name, remediation),
            });
        }

        recommendations
    }

    /// Remediation for a probe, falling back to the suite category
    pub fn remediation_for(
        probe_name: &str,
        category: Option<&ProbeCategory>,
    ) -> (&'static str, &'static str) {
        PROBE_REMEDIATIONS
            .iter()
            .find(|(name, _, _)| *name == probe_name)
            .map(|(_, title, text)| (*title, *text))
            .unwrap_or_else(|| category_remediation(category))
    }
}
