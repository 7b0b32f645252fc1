// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Vector Suite Library
 * Probe registry, suite runner, progress tracking and report aggregation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod cancel;
pub mod config;
pub mod errors;
pub mod http_client;
pub mod rate_limiter;
pub mod types;
pub mod validation;

// Probe contract and built-in probes
pub mod probes;
pub mod registry;

// Orchestration
pub mod engine;
pub mod progress;

pub mod reporting;

// HTTP surface
pub mod api;

pub use cancel::CancelToken;
pub use engine::{SuiteRunner, SuiteRunnerOptions};
pub use errors::{ProbeError, ProbeResult, RegistryError, SuiteError, TrackerError};
pub use probes::{Probe, ProbeContext};
pub use progress::{ProgressRecord, ProgressStatus, ProgressTracker, ProgressUpdate};
pub use registry::{ProbeDescriptor, ProbeRegistry};
pub use types::{Finding, ProbeCategory, ProbeOutcome, Severity, SuiteResult, SuiteStatus};
