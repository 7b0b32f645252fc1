// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Core Data Model
 * Findings, probe categories, per-probe outcomes and suite results
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Severity bucket used for counting and prioritisation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// All buckets, most severe first
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Lower rank sorts first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// One discovered issue. Fields are only readable after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    id: String,
    probe_name: String,
    target: String,
    severity: Severity,
    description: String,
    evidence: Map<String, Value>,
    discovered_at: DateTime<Utc>,
}

impl Finding {
    /// Create a finding; `test_type` prefixes the generated id
    pub fn new(
        test_type: &str,
        probe_name: &str,
        target: &str,
        severity: Severity,
        description: impl Into<String>,
        evidence: Map<String, Value>,
    ) -> Self {
        Self {
            id: format!("{}_{}", test_type, Uuid::new_v4().simple()),
            probe_name: probe_name.to_string(),
            target: target.to_string(),
            severity,
            description: description.into(),
            evidence,
            discovered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn probe_name(&self) -> &str {
        &self.probe_name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn evidence(&self) -> &Map<String, Value> {
        &self.evidence
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }
}

/// Probe category. The three built-in families plus an open-ended tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProbeCategory {
    Owasp,
    LlmAi,
    Infrastructure,
    Custom(String),
}

impl ProbeCategory {
    /// Parse a category label; unknown labels become `Custom`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "owasp" | "owasp_top10" | "owasp-top10" => ProbeCategory::Owasp,
            "llm" | "llm-ai" | "llm_ai" | "llm_ai_security" => ProbeCategory::LlmAi,
            "infra" | "infrastructure" | "infrastructure_security" => {
                ProbeCategory::Infrastructure
            }
            other => ProbeCategory::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProbeCategory::Owasp => "owasp",
            ProbeCategory::LlmAi => "llm",
            ProbeCategory::Infrastructure => "infrastructure",
            ProbeCategory::Custom(name) => name.as_str(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            ProbeCategory::Owasp => "OWASP Top 10".to_string(),
            ProbeCategory::LlmAi => "LLM AI Security".to_string(),
            ProbeCategory::Infrastructure => "Infrastructure Security".to_string(),
            ProbeCategory::Custom(name) => name.clone(),
        }
    }
}

impl std::fmt::Display for ProbeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProbeCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProbeCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(ProbeCategory::parse(&label))
    }
}

/// Result of running a single probe within a suite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { findings: usize },
    Failed { error: String },
    Cancelled,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProbeOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeRun {
    pub probe_name: String,
    pub outcome: ProbeOutcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Completed,
    PartialFailure,
    Failed,
    Cancelled,
}

impl SuiteStatus {
    /// Derive the overall status from per-probe outcomes
    pub fn from_runs(runs: &[ProbeRun]) -> Self {
        if runs
            .iter()
            .any(|r| matches!(r.outcome, ProbeOutcome::Cancelled))
        {
            return SuiteStatus::Cancelled;
        }

        let failed = runs.iter().filter(|r| r.outcome.is_failed()).count();
        if failed == 0 {
            SuiteStatus::Completed
        } else if failed == runs.len() {
            SuiteStatus::Failed
        } else {
            SuiteStatus::PartialFailure
        }
    }
}

/// Aggregate result of one suite run. Built by the runner, immutable after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub suite_id: String,
    pub target: String,
    /// `None` when every registered probe was selected
    pub category: Option<ProbeCategory>,
    pub total_probes: usize,
    pub findings: Vec<Finding>,
    pub per_probe_status: Vec<ProbeRun>,
    pub status: SuiteStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl SuiteResult {
    pub fn category_label(&self) -> &str {
        self.category.as_ref().map(|c| c.as_str()).unwrap_or("all")
    }

    pub fn outcome(&self, probe_name: &str) -> Option<&ProbeOutcome> {
        self.per_probe_status
            .iter()
            .find(|r| r.probe_name == probe_name)
            .map(|r| &r.outcome)
    }

    pub fn total_findings(&self) -> usize {
        self.findings.len()
    }

    pub fn failed_probes(&self) -> usize {
        self.per_probe_status
            .iter()
            .filter(|r| r.outcome.is_failed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_aliases() {
        assert_eq!(ProbeCategory::parse("owasp"), ProbeCategory::Owasp);
        assert_eq!(ProbeCategory::parse("LLM-AI"), ProbeCategory::LlmAi);
        assert_eq!(ProbeCategory::parse("infra"), ProbeCategory::Infrastructure);
        assert_eq!(
            ProbeCategory::parse("cloud"),
            ProbeCategory::Custom("cloud".to_string())
        );
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&ProbeCategory::LlmAi).unwrap();
        assert_eq!(json, "\"llm\"");
        let back: ProbeCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProbeCategory::LlmAi);
    }

    #[test]
    fn test_finding_id_prefix() {
        let finding = Finding::new(
            "reflected_xss",
            "owasp_cross_site_scripting",
            "https://example.com",
            Severity::Medium,
            "Reflected XSS",
            Map::new(),
        );
        assert!(finding.id().starts_with("reflected_xss_"));
        assert_eq!(finding.severity(), Severity::Medium);
    }

    #[test]
    fn test_suite_status_from_runs() {
        let run = |outcome| ProbeRun {
            probe_name: "p".to_string(),
            outcome,
        };

        assert_eq!(SuiteStatus::from_runs(&[]), SuiteStatus::Completed);
        assert_eq!(
            SuiteStatus::from_runs(&[
                run(ProbeOutcome::Success { findings: 1 }),
                run(ProbeOutcome::Failed { error: "x".into() }),
            ]),
            SuiteStatus::PartialFailure
        );
        assert_eq!(
            SuiteStatus::from_runs(&[run(ProbeOutcome::Failed { error: "x".into() })]),
            SuiteStatus::Failed
        );
        assert_eq!(
            SuiteStatus::from_runs(&[
                run(ProbeOutcome::Success { findings: 0 }),
                run(ProbeOutcome::Cancelled),
            ]),
            SuiteStatus::Cancelled
        );
    }
}
