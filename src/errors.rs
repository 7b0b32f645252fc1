// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Error taxonomy for the registry, tracker, suite runner and probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Probe already registered: {name}")]
    DuplicateName { name: String },
}

/// Progress tracker errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Progress id already active: {id}")]
    DuplicateId { id: String },
}

/// Errors that abort a whole suite before any probe runs
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Testing not permitted against {target}: {reason}")]
    PermissionDenied { target: String, reason: String },

    #[error("Invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Failure of a single probe. Contained by the runner, never escapes a suite.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Probe timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("DNS resolution failed for {host}: {reason}")]
    Dns { host: String, reason: String },

    #[error("Probe cancelled")]
    Cancelled,

    #[error("Probe error: {0}")]
    Other(String),
}

impl ProbeError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ProbeError::Network(_) => true,
            ProbeError::Timeout { .. } => true,
            ProbeError::Http { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            ProbeError::Dns { .. } => false,
            ProbeError::Cancelled => false,
            ProbeError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout {
                duration: Duration::from_secs(30),
            }
        } else if err.is_status() {
            ProbeError::Http {
                status: err.status().map(|s| s.as_u16()).unwrap_or_default(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if err.is_connect() || err.is_request() {
            ProbeError::Network(err.to_string())
        } else {
            ProbeError::Other(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ProbeError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ProbeError>() {
            Ok(probe_err) => return probe_err,
            Err(other) => other,
        };
        match err.downcast::<reqwest::Error>() {
            Ok(req) => ProbeError::from(req),
            Err(other) => ProbeError::Other(format!("{:#}", other)),
        }
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
