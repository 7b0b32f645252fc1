// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::types::SecurityReport;
use crate::types::{ProbeOutcome, Severity};
use anyhow::Result;

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, report: &SecurityReport) -> Result<Vec<u8>> {
        Ok(self.generate_markdown(report).into_bytes())
    }

    fn generate_markdown(&self, report: &SecurityReport) -> String {
        let mut md = String::new();

        md.push_str("# Security Assessment Report\n\n");
        md.push_str(&format!("**Target:** {}\n\n", report.target));
        md.push_str(&format!("**Suite:** {} ({})\n\n", report.category, report.suite_id));
        md.push_str(&format!("**Status:** {:?}\n\n", report.status));
        md.push_str(&format!(
            "**Generated:** {}\n\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str("---\n\n");

        md.push_str("## Vulnerability Summary\n\n");
        md.push_str("| Severity | Count |\n");
        md.push_str("|----------|-------|\n");
        for severity in Severity::ALL {
            md.push_str(&format!(
                "| [{}] | {} |\n",
                severity,
                report.summary.count(severity)
            ));
        }
        md.push_str(&format!("| **Total** | **{}** |\n\n", report.summary.total));

        md.push_str("## Probe Results\n\n");
        md.push_str("| Probe | Outcome |\n");
        md.push_str("|-------|---------|\n");
        for run in &report.per_probe_status {
            let outcome = match &run.outcome {
                ProbeOutcome::Success { findings } => format!("success ({} findings)", findings),
                ProbeOutcome::Failed { error } => format!("failed: {}", error.replace('|', "\\|")),
                ProbeOutcome::Cancelled => "cancelled".to_string(),
            };
            md.push_str(&format!("| {} | {} |\n", run.probe_name, outcome));
        }
        md.push('\n');

        md.push_str("## Detailed Findings\n\n");
        if report.findings.is_empty() {
            md.push_str("No vulnerabilities were found.\n\n");
        }
        for finding in &report.findings {
            md.push_str(&format!("### {}\n\n", finding.id()));
            md.push_str(&format!("- **Severity:** {}\n", finding.severity()));
            md.push_str(&format!("- **Probe:** {}\n", finding.probe_name()));
            md.push_str(&format!("- **Description:** {}\n", finding.description()));
            if !finding.evidence().is_empty() {
                let evidence = serde_json::to_string_pretty(finding.evidence()).unwrap_or_default();
                md.push_str(&format!("\n```json\n{}\n```\n", evidence));
            }
            md.push('\n');
        }

        md.push_str("## Recommendations\n\n");
        for (idx, rec) in report.recommendations.iter().enumerate() {
            md.push_str(&format!(
                "{}. **{}** [{}]: {}\n",
                idx + 1,
                rec.title,
                rec.priority,
                rec.description
            ));
        }
        md.push_str("\n---\n\n");
        md.push_str(&format!("*Report {}*\n", report.report_id));

        md
    }
}

impl Default for MarkdownReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
