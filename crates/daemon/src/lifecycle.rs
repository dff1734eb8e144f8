// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::path::{Path, PathBuf};

use composer_core::{ConfigError, Engine, EngineConfig, EngineError, WorkflowSourceConfig};
use composer_storage::JSON_FILE_KIND;
use thiserror::Error;
use tracing::{info, warn};

/// Id and directory of the source written into a fresh config
pub const DEFAULT_SOURCE_ID: &str = "workflows";
pub const DEFAULT_SOURCE_DIR: &str = "./workflows";

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Config used when none exists yet: one JSON-file source under `./workflows`
pub fn default_config() -> EngineConfig {
    EngineConfig::default().with_source(WorkflowSourceConfig::new(
        DEFAULT_SOURCE_ID,
        JSON_FILE_KIND,
        DEFAULT_SOURCE_DIR,
    ))
}

/// Load the TOML config at `path`, writing the default one first if missing
pub fn load_or_create_config(path: &Path) -> Result<EngineConfig, LifecycleError> {
    if path.exists() {
        return Ok(EngineConfig::load(path)?);
    }

    let config = default_config();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LifecycleError::Write(parent.into(), e))?;
    }
    std::fs::write(path, config.to_toml_string()?)
        .map_err(|e| LifecycleError::Write(path.into(), e))?;
    info!(path = %path.display(), "wrote default config");
    Ok(config)
}

/// Load the config without touching the filesystem; missing means default
pub fn load_config(path: &Path) -> Result<EngineConfig, LifecycleError> {
    if path.exists() {
        Ok(EngineConfig::load(path)?)
    } else {
        Ok(default_config())
    }
}

/// One human-readable line per configured source
pub fn summary(config: &EngineConfig) -> Vec<String> {
    config
        .sources
        .iter()
        .map(|source| {
            let note = if source.kind == JSON_FILE_KIND {
                ""
            } else {
                " (kind not built in)"
            };
            format!(
                "source {}: kind={} uri={}{}",
                source.id, source.kind, source.uri, note
            )
        })
        .collect()
}

/// Build the engine with the built-in catalog and source kinds, then initialize it
///
/// Must run inside a tokio runtime.
pub fn startup(config: EngineConfig) -> Result<Engine, LifecycleError> {
    let sources = config.sources.len();
    for source in &config.sources {
        if source.kind != JSON_FILE_KIND {
            warn!(
                source = %source.id,
                kind = %source.kind,
                "source kind is not built in, it will be skipped"
            );
        }
    }

    let builder = Engine::builder(config).with_plugins(composer_plugins::install);
    let engine = composer_storage::register(builder).build()?;
    engine.initialize();

    info!(
        sources,
        workflows = engine.interpreter().workflow_ids().len(),
        "engine started"
    );
    Ok(engine)
}

/// Cancel every timer the engine scheduled
pub fn shutdown(engine: &Engine) {
    engine.shutdown();
    info!("engine stopped");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
