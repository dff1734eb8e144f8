// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Read from TOML on disk by hosts; every section has defaults so an empty
//! document is a valid configuration with no sources.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: String,
    pub sources: Vec<WorkflowSourceConfig>,
    pub reconcile: ReconcileConfig,
    pub bindings: BindingsConfig,
}

/// One external store of workflow definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSourceConfig {
    pub id: String,
    /// Factory name, e.g. `json-file`
    pub kind: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Kind-specific settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl WorkflowSourceConfig {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            uri: uri.into(),
            username: None,
            password: None,
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Default tick interval for source monitors
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub strategy: ReconcileStrategy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            strategy: ReconcileStrategy::default(),
        }
    }
}

/// How a reconciliation tick treats ids present on only one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileStrategy {
    /// Remove ids only at the source, load ids only in the engine
    #[default]
    Literal,
    /// Load ids only at the source, remove ids only in the engine
    SourceAuthoritative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingsConfig {
    /// Skip bindings whose `enabled` flag is false
    pub honor_enabled: bool,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_source(mut self, source: WorkflowSourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source(&self, id: &str) -> Option<&WorkflowSourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.interval.is_zero() {
            return Err(ConfigError::Invalid("reconcile.interval must be positive".to_string()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(ConfigError::Invalid("source id must not be empty".to_string()));
            }
            if source.kind.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has no kind",
                    source.id
                )));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
