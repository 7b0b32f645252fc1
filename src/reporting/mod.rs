// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod aggregator;
pub mod engine;
pub mod formats;
pub mod store;
pub mod types;

pub use aggregator::ReportAggregator;
pub use engine::ReportEngine;
pub use store::ReportStore;
pub use types::{Recommendation, ReportFormat, ReportOutput, SecurityReport, Summary};
