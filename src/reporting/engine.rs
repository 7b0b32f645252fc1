// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::{
    aggregator::ReportAggregator,
    formats::{
        csv::CsvReportGenerator, html::HtmlReportGenerator, json::JsonReportGenerator,
        markdown::MarkdownReportGenerator,
    },
    types::*,
};
use crate::types::SuiteResult;
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub struct ReportEngine {
    json: JsonReportGenerator,
    markdown: MarkdownReportGenerator,
    csv: CsvReportGenerator,
    html: HtmlReportGenerator,
}

impl ReportEngine {
    pub fn new() -> Self {
        Self {
            json: JsonReportGenerator::new(),
            markdown: MarkdownReportGenerator::new(),
            csv: CsvReportGenerator::new(),
            html: HtmlReportGenerator::new(),
        }
    }

    pub fn build(&self, result: &SuiteResult) -> SecurityReport {
        let summary = ReportAggregator::summarize(result);
        let recommendations = ReportAggregator::recommend(result, &summary);

        let report = SecurityReport {
            report_id: format!("report_{}", Uuid::new_v4().simple()),
            target: result.target.clone(),
            suite_id: result.suite_id.clone(),
            category: result.category_label().to_string(),
            status: result.status,
            generated_at: Utc::now(),
            duration_ms: result.duration_ms,
            summary,
            findings: result.findings.clone(),
            recommendations,
            per_probe_status: result.per_probe_status.clone(),
        };

        info!(
            "Report {} built for suite {}: {} findings, {} recommendations",
            report.report_id,
            report.suite_id,
            report.summary.total,
            report.recommendations.len()
        );
        report
    }

    pub fn render(&self, report: &SecurityReport, format: ReportFormat) -> Result<ReportOutput> {
        let data = match format {
            ReportFormat::Json => self.json.generate(report),
            ReportFormat::Markdown => self.markdown.generate(report),
            ReportFormat::Csv => self.csv.generate(report),
            ReportFormat::Html => self.html.generate(report),
        }
        .with_context(|| format!("Failed to render {} report {}", format, report.report_id))?;

        Ok(ReportOutput {
            format,
            data,
            filename: format!("{}.{}", report.report_id, format.extension()),
            mime_type: format.mime_type().to_string(),
        })
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}
