// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::core::ScannerConfig;

/// On-disk encodings accepted for the scanner configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    fn decode(self, content: &str) -> Result<ScannerConfig> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Malformed YAML config"),
            ConfigFormat::Toml => toml::from_str(content).context("Malformed TOML config"),
            ConfigFormat::Json => serde_json::from_str(content).context("Malformed JSON config"),
        }
    }

    fn encode(self, config: &ScannerConfig) -> Result<String> {
        let text = match self {
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        };
        Ok(text)
    }
}

/// File-backed settings: decode, apply environment overrides, validate
pub struct ConfigLoader {
    path: PathBuf,
    format: ConfigFormat,
}

impl ConfigLoader {
    /// Format is taken from the file extension
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;
        Ok(Self { path, format })
    }

    pub fn with_format<P: AsRef<Path>>(path: P, format: ConfigFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .with_context(|| format!("{:?} has no file extension", path))?;
        ConfigFormat::from_extension(extension)
            .with_context(|| format!("Unsupported config extension '.{}'", extension))
    }

    pub fn load(&self) -> Result<ScannerConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// `lookup` stands in for the process environment
    pub fn load_with<F>(&self, lookup: F) -> Result<ScannerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config file {:?}", self.path))?;

        let mut config = self
            .format
            .decode(&content)
            .with_context(|| format!("Invalid config file {:?}", self.path))?;
        config.apply_overrides(lookup)?;
        config.check()?;

        debug!("Configuration loaded from {:?} ({:?})", self.path, self.format);
        Ok(config)
    }

    /// Validates before writing so an invalid config never reaches disk
    pub fn save(&self, config: &ScannerConfig) -> Result<()> {
        config.check()?;
        let text = self.format.encode(config)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Cannot write config file {:?}", self.path))?;
        info!("Configuration written to {:?}", self.path);
        Ok(())
    }
}
