// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::types::SecurityReport;
use anyhow::Result;
use csv::Writer;

pub struct CsvReportGenerator;

impl CsvReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// One row per finding; evidence is serialized as compact JSON
    pub fn generate(&self, report: &SecurityReport) -> Result<Vec<u8>> {
        let mut wtr = Writer::from_writer(vec![]);

        wtr.write_record([
            "ID",
            "Probe",
            "Severity",
            "Target",
            "Description",
            "Evidence",
            "Discovered At",
        ])?;

        for finding in &report.findings {
            let evidence = serde_json::to_string(finding.evidence())?;
            wtr.write_record([
                finding.id(),
                finding.probe_name(),
                finding.severity().as_str(),
                finding.target(),
                finding.description(),
                evidence.as_str(),
                finding.discovered_at().to_rfc3339().as_str(),
            ])?;
        }

        let data = wtr.into_inner()?;
        Ok(data)
    }
}

impl Default for CsvReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
