// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::types::{Recommendation, SecurityReport, Summary};
use crate::types::{Finding, ProbeOutcome, ProbeRun, Severity};
use anyhow::Result;

pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, report: &SecurityReport) -> Result<Vec<u8>> {
        Ok(self.generate_html(report).into_bytes())
    }

    fn generate_html(&self, report: &SecurityReport) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Security Assessment Report - {}</title>
    <style>
        {}
    </style>
</head>
<body>
    <div class="container">
        {}
        {}
        {}
        {}
        {}
    </div>
</body>
</html>"#,
            self.escape_html(&report.target),
            self.get_css(),
            self.generate_header(report),
            self.generate_summary(&report.summary),
            self.generate_probe_table(&report.per_probe_status),
            self.generate_findings(&report.findings),
            self.generate_recommendations(&report.recommendations),
        )
    }

    fn get_css(&self) -> &'static str {
        r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: 'JetBrains Mono', monospace; line-height: 1.6; color: #e0e0e0; background-color: #0a0a0a; }
        .container { max-width: 1200px; margin: 0 auto; padding: 20px; }
        h1, h2 { margin: 24px 0 12px; }
        table { width: 100%; border-collapse: collapse; margin-bottom: 16px; }
        th, td { border: 1px solid #333; padding: 6px 10px; text-align: left; }
        pre { background: #161616; padding: 10px; overflow-x: auto; }
        .finding { border-left: 4px solid #555; padding: 8px 12px; margin-bottom: 12px; }
        .severity-critical { border-color: #dc2626; }
        .severity-high { border-color: #ea580c; }
        .severity-medium { border-color: #ca8a04; }
        .severity-low { border-color: #2563eb; }
        .severity-info { border-color: #6b7280; }
        "#
    }

    fn generate_header(&self, report: &SecurityReport) -> String {
        format!(
            r#"<header>
            <h1>Security Assessment Report</h1>
            <p><strong>Target:</strong> {}</p>
            <p><strong>Suite:</strong> {} ({})</p>
            <p><strong>Status:</strong> {:?}</p>
            <p><strong>Generated:</strong> {}</p>
        </header>"#,
            self.escape_html(&report.target),
            self.escape_html(&report.category),
            self.escape_html(&report.suite_id),
            report.status,
            report.generated_at.to_rfc3339(),
        )
    }

    fn generate_summary(&self, summary: &Summary) -> String {
        let rows: String = Severity::ALL
            .iter()
            .map(|s| format!("<tr><td>{}</td><td>{}</td></tr>", s, summary.count(*s)))
            .collect();
        format!(
            "<section><h2>Vulnerability Summary</h2><table><tr><th>Severity</th><th>Count</th></tr>{}<tr><th>Total</th><th>{}</th></tr></table></section>",
            rows, summary.total
        )
    }

    fn generate_probe_table(&self, runs: &[ProbeRun]) -> String {
        let rows: String = runs
            .iter()
            .map(|run| {
                let outcome = match &run.outcome {
                    ProbeOutcome::Success { findings } => format!("success ({} findings)", findings),
                    ProbeOutcome::Failed { error } => format!("failed: {}", error),
                    ProbeOutcome::Cancelled => "cancelled".to_string(),
                };
                format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    self.escape_html(&run.probe_name),
                    self.escape_html(&outcome)
                )
            })
            .collect();
        format!(
            "<section><h2>Probe Results</h2><table><tr><th>Probe</th><th>Outcome</th></tr>{}</table></section>",
            rows
        )
    }

    fn generate_findings(&self, findings: &[Finding]) -> String {
        if findings.is_empty() {
            return "<section><h2>Findings</h2><p>No vulnerabilities were found.</p></section>".to_string();
        }

        let items: String = findings
            .iter()
            .map(|f| {
                let evidence = serde_json::to_string_pretty(f.evidence()).unwrap_or_default();
                format!(
                    r#"<div class="finding severity-{}"><h3>[{}] {}</h3><p>{}</p><pre>{}</pre></div>"#,
                    f.severity().as_str(),
                    f.severity(),
                    self.escape_html(f.probe_name()),
                    self.escape_html(f.description()),
                    self.escape_html(&evidence),
                )
            })
            .collect();
        format!("<section><h2>Findings</h2>{}</section>", items)
    }

    fn generate_recommendations(&self, recommendations: &[Recommendation]) -> String {
        let items: String = recommendations
            .iter()
            .map(|r| {
                format!(
                    "<li><strong>{}</strong> [{}]: {}</li>",
                    self.escape_html(&r.title),
                    r.priority,
                    self.escape_html(&r.description)
                )
            })
            .collect();
        format!("<section><h2>Recommendations</h2><ol>{}</ol></section>", items)
    }

    fn escape_html(&self, text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
    }
}

impl Default for HtmlReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
