// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory definition source

use super::{DefinitionSource, SourceError};
use crate::workflow::{InitializerDefinition, WorkflowDefinition};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Definitions held in process; hosts mutate it directly
#[derive(Debug, Default)]
pub struct MemorySource {
    workflows: RwLock<BTreeMap<String, WorkflowDefinition>>,
    initializers: RwLock<Vec<InitializerDefinition>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflow(self, definition: WorkflowDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn with_initializer(self, initializer: InitializerDefinition) -> Self {
        self.initializers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(initializer);
        self
    }

    /// Insert or replace a definition
    pub fn insert(&self, definition: WorkflowDefinition) {
        self.workflows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(definition.id.clone(), definition);
    }

    pub fn remove(&self, id: &str) -> Option<WorkflowDefinition> {
        self.workflows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }
}

impl DefinitionSource for MemorySource {
    fn load(&self, id: &str) -> Result<WorkflowDefinition, SourceError> {
        self.workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    fn save(&self, definition: &WorkflowDefinition) -> Result<(), SourceError> {
        if definition.id.is_empty() {
            return Err(SourceError::InvalidId(definition.id.clone()));
        }
        self.insert(definition.clone());
        Ok(())
    }

    fn version(&self, id: &str) -> Result<Option<String>, SourceError> {
        Ok(self
            .workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .map(|def| def.version.clone()))
    }

    fn list_ids(&self) -> Result<Vec<String>, SourceError> {
        Ok(self
            .workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    fn initializers(&self) -> Result<Vec<InitializerDefinition>, SourceError> {
        Ok(self
            .initializers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
