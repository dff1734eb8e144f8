// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External stores of workflow definitions
//!
//! The engine only sees the `DefinitionSource` trait. Concrete stores are
//! registered by kind and instantiated lazily, once per configured source.

mod memory;

pub use memory::MemorySource;

use crate::config::WorkflowSourceConfig;
use crate::workflow::{InitializerDefinition, WorkflowDefinition};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("workflow '{0}' not found")]
    NotFound(String),
    #[error("invalid workflow id '{0}'")]
    InvalidId(String),
    #[error("no source kind '{0}' is registered")]
    UnknownKind(String),
    #[error("no source '{0}' is configured")]
    UnknownSource(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed definition '{id}': {source}")]
    Malformed {
        id: String,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// A store the engine loads workflow definitions from
pub trait DefinitionSource: Send + Sync {
    /// Load one definition; `SourceError::NotFound` when absent
    fn load(&self, id: &str) -> Result<WorkflowDefinition, SourceError>;

    fn save(&self, definition: &WorkflowDefinition) -> Result<(), SourceError>;

    /// Current version of `id`, `None` when absent
    fn version(&self, id: &str) -> Result<Option<String>, SourceError>;

    /// Authoritative snapshot of every id available
    fn list_ids(&self) -> Result<Vec<String>, SourceError>;

    /// Bootstrap work to run once when the engine starts
    fn initializers(&self) -> Result<Vec<InitializerDefinition>, SourceError> {
        Ok(Vec::new())
    }
}

/// Creates a source from its configuration
pub type SourceFactory = Arc<
    dyn Fn(&WorkflowSourceConfig) -> Result<Arc<dyn DefinitionSource>, SourceError> + Send + Sync,
>;

/// Configured sources, the factories that build them, and the built instances
pub struct SourceCatalog {
    configs: Vec<WorkflowSourceConfig>,
    kinds: HashMap<String, SourceFactory>,
    instances: RwLock<HashMap<String, Arc<dyn DefinitionSource>>>,
}

impl SourceCatalog {
    pub(crate) fn new(
        configs: Vec<WorkflowSourceConfig>,
        kinds: HashMap<String, SourceFactory>,
        instances: HashMap<String, Arc<dyn DefinitionSource>>,
    ) -> Self {
        Self {
            configs,
            kinds,
            instances: RwLock::new(instances),
        }
    }

    pub fn configs(&self) -> &[WorkflowSourceConfig] {
        &self.configs
    }

    pub fn config(&self, id: &str) -> Option<&WorkflowSourceConfig> {
        self.configs.iter().find(|c| c.id == id)
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Source for a configured id
    pub fn get(&self, id: &str) -> Result<Arc<dyn DefinitionSource>, SourceError> {
        let config = self
            .config(id)
            .ok_or_else(|| SourceError::UnknownSource(id.to_string()))?;
        self.instantiate(config)
    }

    /// Source for `config`, built on first use and cached by id
    pub fn instantiate(
        &self,
        config: &WorkflowSourceConfig,
    ) -> Result<Arc<dyn DefinitionSource>, SourceError> {
        if let Some(source) = self
            .instances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&config.id)
        {
            return Ok(Arc::clone(source));
        }

        let factory = self
            .kinds
            .get(&config.kind)
            .ok_or_else(|| SourceError::UnknownKind(config.kind.clone()))?;
        let built = factory(config)?;

        let mut instances = self.instances.write().unwrap_or_else(|e| e.into_inner());
        let source = instances.entry(config.id.clone()).or_insert(built);
        tracing::info!(source = %config.id, kind = %config.kind, "definition source ready");
        Ok(Arc::clone(source))
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
