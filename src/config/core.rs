// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use validator::Validate;

/// Runtime settings for the suite runner, probes and HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_max_concurrent_tests")]
    pub max_concurrent_tests: usize,

    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_test_timeout")]
    pub test_timeout_secs: u64,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,

    #[validate(range(min = 1, max = 60000))]
    #[serde(default = "default_requests_per_minute")]
    pub rate_limit_requests_per_minute: u32,

    /// Refuse loopback, private and link-local targets
    #[serde(default = "default_true")]
    pub safe_testing_mode: bool,

    #[serde(default)]
    pub denied_hosts: Vec<String>,

    #[validate(length(min = 1))]
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[validate(range(min = 1024))]
    #[serde(default = "default_max_body_size")]
    pub max_response_body_bytes: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tests: default_max_concurrent_tests(),
            test_timeout_secs: default_test_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_retries(),
            rate_limit_enabled: true,
            rate_limit_requests_per_minute: default_requests_per_minute(),
            safe_testing_mode: true,
            denied_hosts: Vec::new(),
            bind_address: default_bind_address(),
            user_agent: None,
            max_response_body_bytes: default_max_body_size(),
        }
    }
}

impl ScannerConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup. Unset keys are left alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MAX_CONCURRENT_TESTS") {
            self.max_concurrent_tests = value
                .trim()
                .parse()
                .context("Invalid MAX_CONCURRENT_TESTS")?;
        }

        if let Some(value) = lookup("TEST_TIMEOUT") {
            self.test_timeout_secs = value.trim().parse().context("Invalid TEST_TIMEOUT")?;
        }

        if let Some(value) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit_enabled = parse_bool(&value).context("Invalid RATE_LIMIT_ENABLED")?;
        }

        if let Some(value) = lookup("RATE_LIMIT_REQUESTS_PER_MINUTE") {
            self.rate_limit_requests_per_minute = value
                .trim()
                .parse()
                .context("Invalid RATE_LIMIT_REQUESTS_PER_MINUTE")?;
        }

        if let Some(value) = lookup("SAFE_TESTING_MODE") {
            self.safe_testing_mode = parse_bool(&value).context("Invalid SAFE_TESTING_MODE")?;
        }

        if let Some(value) = lookup("BIND_ADDRESS") {
            self.bind_address = value.trim().to_string();
        }

        Ok(())
    }

    /// Range validation plus checks the derive cannot express
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind_address))
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean, got '{}'", other)),
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_tests() -> usize {
    5
}

fn default_test_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScannerConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.max_concurrent_tests, 5);
        assert_eq!(config.test_timeout(), Duration::from_secs(30));
        assert!(config.safe_testing_mode);
    }

    #[test]
    fn test_overrides_applied() {
        let env: HashMap<&str, &str> = [
            ("MAX_CONCURRENT_TESTS", "8"),
            ("TEST_TIMEOUT", "12"),
            ("SAFE_TESTING_MODE", "false"),
            ("BIND_ADDRESS", "0.0.0.0:8080"),
        ]
        .into_iter()
        .collect();

        let mut config = ScannerConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.max_concurrent_tests, 8);
        assert_eq!(config.test_timeout_secs, 12);
        assert!(!config.safe_testing_mode);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut config = ScannerConfig::default();
        let result = config.apply_overrides(|k| {
            (k == "RATE_LIMIT_ENABLED").then(|| "maybe".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let config = ScannerConfig {
            max_concurrent_tests: 0,
            ..Default::default()
        };
        assert!(config.check().is_err());

        let config = ScannerConfig {
            bind_address: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(config.check().is_err());
    }
}
