// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::reporting::types::SecurityReport;

/// Process-local report storage
#[derive(Default)]
pub struct ReportStore {
    reports: RwLock<HashMap<String, SecurityReport>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, report: SecurityReport) {
        self.reports.write().insert(report.report_id.clone(), report);
    }

    pub fn get(&self, report_id: &str) -> Option<SecurityReport> {
        self.reports.read().get(report_id).cloned()
    }

    /// Reports sorted newest first
    pub fn all(&self) -> Vec<SecurityReport> {
        let mut reports: Vec<_> = self.reports.read().values().cloned().collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        reports
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}
