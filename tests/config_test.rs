// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::Builder;
use vector_suite::config::{ConfigFormat, ConfigLoader, ScannerConfig};

fn temp_config(suffix: &str, content: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_load_toml() -> Result<()> {
    let file = temp_config(
        ".toml",
        r#"
max_concurrent_tests = 8
test_timeout_secs = 45
rate_limit_enabled = false
bind_address = "127.0.0.1:9090"
"#,
    )?;

    let loader = ConfigLoader::new(file.path())?;
    let config = loader.load_with(|_| None)?;

    assert_eq!(config.max_concurrent_tests, 8);
    assert_eq!(config.test_timeout(), Duration::from_secs(45));
    assert!(!config.rate_limit_enabled);
    assert_eq!(config.socket_addr()?.port(), 9090);
    Ok(())
}

#[test]
fn test_load_json() -> Result<()> {
    let file = temp_config(
        ".json",
        r#"{"max_retries": 3, "denied_hosts": ["*.internal.example.com"]}"#,
    )?;

    let config = ConfigLoader::new(file.path())?.load_with(|_| None)?;
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.denied_hosts, vec!["*.internal.example.com".to_string()]);
    assert!(config.safe_testing_mode);
    Ok(())
}

#[test]
fn test_environment_overrides_file() -> Result<()> {
    let file = temp_config(".yaml", "max_concurrent_tests: 2\nsafe_testing_mode: true\n")?;
    let env: HashMap<&str, &str> = HashMap::from([
        ("MAX_CONCURRENT_TESTS", "12"),
        ("TEST_TIMEOUT", "90"),
        ("SAFE_TESTING_MODE", "false"),
        ("RATE_LIMIT_REQUESTS_PER_MINUTE", "120"),
    ]);

    let config = ConfigLoader::new(file.path())?
        .load_with(|key| env.get(key).map(|v| v.to_string()))?;

    assert_eq!(config.max_concurrent_tests, 12);
    assert_eq!(config.test_timeout_secs, 90);
    assert!(!config.safe_testing_mode);
    assert_eq!(config.rate_limit_requests_per_minute, 120);
    Ok(())
}

#[test]
fn test_out_of_range_value_rejected() -> Result<()> {
    let file = temp_config(".yml", "max_concurrent_tests: 0\n")?;
    assert!(ConfigLoader::new(file.path())?.load_with(|_| None).is_err());
    Ok(())
}

#[test]
fn test_unparseable_override_rejected() {
    let mut config = ScannerConfig::default();
    assert!(config
        .apply_overrides(|key| (key == "TEST_TIMEOUT").then(|| "soon".to_string()))
        .is_err());
}

#[test]
fn test_bad_bind_address_rejected() {
    let config = ScannerConfig {
        bind_address: "not-an-address".to_string(),
        ..Default::default()
    };
    assert!(config.check().is_err());
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("suite.toml");
    let loader = ConfigLoader::with_format(&path, ConfigFormat::Toml);

    let config = ScannerConfig {
        max_concurrent_tests: 7,
        denied_hosts: vec!["prod.example.com".to_string()],
        ..Default::default()
    };
    loader.save(&config)?;

    let reloaded = loader.load_with(|_| None)?;
    assert_eq!(reloaded.max_concurrent_tests, 7);
    assert_eq!(reloaded.denied_hosts, config.denied_hosts);
    Ok(())
}
