// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based definition source
//!
//! Layout under the source directory:
//!
//! ```text
//! <uri>/
//!   <id>.json            one workflow definition per file
//!   initializers/
//!     default.json       created on first read when the directory is missing
//! ```

use composer_core::workflow::{ActionDefinition, ConditionDefinition};
use composer_core::{DefinitionSource, InitializerDefinition, SourceError, WorkflowDefinition};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const JSON_FILE_KIND: &str = "json-file";

const INITIALIZERS_DIR: &str = "initializers";
const DEFAULT_MONITOR_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid workflow id '{0}': use letters, digits, '-' and '_'")]
    InvalidId(String),
}

impl From<StorageError> for SourceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io { path, source } => SourceError::Io { path, source },
            StorageError::Json { path, source } => SourceError::Malformed {
                id: path.display().to_string(),
                source,
            },
            StorageError::InvalidId(id) => SourceError::InvalidId(id),
        }
    }
}

/// Workflow definitions stored as pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    base_path: PathBuf,
}

impl JsonFileSource {
    /// Open a source rooted at `base_path`, creating the directory if needed
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|source| StorageError::Io {
            path: base_path.clone(),
            source,
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{id}.json"))
    }

    fn initializers_dir(&self) -> PathBuf {
        self.base_path.join(INITIALIZERS_DIR)
    }

    /// Read `id`, `None` when its file does not exist
    fn read(&self, id: &str) -> Result<Option<WorkflowDefinition>, StorageError> {
        validate_id(id)?;
        let path = self.path_for(id);
        let Some(mut definition) = read_json::<WorkflowDefinition>(&path)? else {
            return Ok(None);
        };
        // The file name is authoritative
        if definition.id != id {
            if !definition.id.is_empty() {
                tracing::warn!(
                    path = %path.display(),
                    declared = %definition.id,
                    "workflow id does not match file name, using file name"
                );
            }
            definition.id = id.to_string();
        }
        Ok(Some(definition))
    }

    fn write_default_initializer(&self, dir: &Path) -> Result<(), StorageError> {
        let initializer = InitializerDefinition {
            conditions: vec![ConditionDefinition::new("source.available")],
            actions: vec![ActionDefinition::new("source.monitor")
                .with_arg("interval", DEFAULT_MONITOR_INTERVAL_MS)],
        };
        let path = dir.join("default.json");
        write_json(&path, &initializer)?;
        tracing::info!(path = %path.display(), "created default initializer");
        Ok(())
    }
}

impl DefinitionSource for JsonFileSource {
    fn load(&self, id: &str) -> Result<WorkflowDefinition, SourceError> {
        tracing::debug!(workflow_id = %id, dir = %self.base_path.display(), "loading workflow");
        let definition = self
            .read(id)?
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        tracing::info!(
            workflow_id = %definition.id,
            version = %definition.version,
            "loaded workflow"
        );
        Ok(definition)
    }

    fn save(&self, definition: &WorkflowDefinition) -> Result<(), SourceError> {
        validate_id(&definition.id)?;
        let path = self.path_for(&definition.id);
        write_json(&path, definition)?;
        tracing::info!(workflow_id = %definition.id, path = %path.display(), "saved workflow");
        Ok(())
    }

    fn version(&self, id: &str) -> Result<Option<String>, SourceError> {
        Ok(self.read(id)?.map(|definition| definition.version))
    }

    fn list_ids(&self) -> Result<Vec<String>, SourceError> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(dir = %self.base_path.display(), "workflow directory is missing");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.base_path.clone(),
                    source,
                })
            }
        };

        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_json_extension(path))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        ids.sort();
        tracing::debug!(count = ids.len(), dir = %self.base_path.display(), "listed workflows");
        Ok(ids)
    }

    fn initializers(&self) -> Result<Vec<InitializerDefinition>, SourceError> {
        let dir = self.initializers_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| SourceError::Io {
                path: dir.clone(),
                source,
            })?;
            tracing::info!(dir = %dir.display(), "created initializer directory");
            if let Err(e) = self.write_default_initializer(&dir) {
                tracing::error!(error = %e, "failed to create default initializer");
            }
        }

        let entries = fs::read_dir(&dir).map_err(|source| SourceError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_json_extension(path))
            .collect();
        paths.sort();

        let mut initializers = Vec::with_capacity(paths.len());
        for path in paths {
            match read_json::<InitializerDefinition>(&path) {
                Ok(Some(initializer)) => initializers.push(initializer),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "skipping initializer"),
            }
        }
        Ok(initializers)
    }
}

fn validate_id(id: &str) -> Result<(), StorageError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
