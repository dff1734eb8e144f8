// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source reconciliation
//!
//! A `SourceMonitor` diffs one definition source against the interpreter's
//! loaded set and applies the difference as removals, additions and
//! reloads, in that order. Any failure for a single id is logged and
//! recorded in the report; the rest of the tick carries on.

mod behaviors;

pub use behaviors::{register, MonitorSource, SourceAvailable, SOURCE_AVAILABLE, SOURCE_MONITOR};

use crate::config::{ReconcileStrategy, WorkflowSourceConfig};
use crate::engine::{Engine, WeakEngine};
use crate::source::{DefinitionSource, SourceError};
use crate::workflow::WorkflowDefinition;
use std::collections::BTreeSet;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// `(workflow id or source id, error)` pairs
    pub failures: Vec<(String, String)>,
}

impl ReconcileReport {
    /// True when the tick changed nothing and hit no errors
    pub fn is_quiet(&self) -> bool {
        self.removed.is_empty()
            && self.added.is_empty()
            && self.updated.is_empty()
            && self.failures.is_empty()
    }
}

/// Periodic diff-and-apply between one source and the interpreter
pub struct SourceMonitor {
    engine: WeakEngine,
    source: WorkflowSourceConfig,
    strategy: ReconcileStrategy,
}

impl SourceMonitor {
    pub fn new(
        engine: WeakEngine,
        source: WorkflowSourceConfig,
        strategy: ReconcileStrategy,
    ) -> Self {
        Self {
            engine,
            source,
            strategy,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source.id
    }

    /// Run one reconciliation pass
    pub fn tick(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let Some(engine) = self.engine.upgrade() else {
            return report;
        };
        let source_id = self.source.id.as_str();

        let source = match engine.sources().instantiate(&self.source) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(source = source_id, error = %e, "source unavailable");
                report.failures.push((source_id.to_string(), e.to_string()));
                return report;
            }
        };
        let available: BTreeSet<String> = match source.list_ids() {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::error!(source = source_id, error = %e, "failed to list workflows");
                report.failures.push((source_id.to_string(), e.to_string()));
                return report;
            }
        };
        let loaded: BTreeSet<String> = engine.interpreter().workflow_ids().into_iter().collect();

        let only_source: Vec<&String> = available.difference(&loaded).collect();
        let only_loaded: Vec<&String> = loaded.difference(&available).collect();
        let (to_remove, to_add) = match self.strategy {
            ReconcileStrategy::Literal => (only_source, only_loaded),
            ReconcileStrategy::SourceAuthoritative => (only_loaded, only_source),
        };
        tracing::trace!(
            source = source_id,
            remove = to_remove.len(),
            add = to_add.len(),
            "reconciling"
        );

        for id in to_remove {
            engine.interpreter().remove_workflow(id);
            report.removed.push(id.clone());
        }

        for id in to_add {
            match load(source.as_ref(), id) {
                Ok(definition) => {
                    engine.interpreter().add_workflow(definition);
                    report.added.push(id.clone());
                }
                Err(e) => {
                    tracing::error!(
                        source = source_id,
                        workflow_id = %id,
                        error = %e,
                        "failed to load workflow"
                    );
                    report.failures.push((id.clone(), e.to_string()));
                }
            }
        }

        for id in available.intersection(&loaded) {
            match self.reload_if_changed(&engine, source.as_ref(), id) {
                Ok(true) => report.updated.push(id.clone()),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        source = source_id,
                        workflow_id = %id,
                        error = %e,
                        "failed to refresh workflow"
                    );
                    report.failures.push((id.clone(), e.to_string()));
                }
            }
        }

        if !report.is_quiet() {
            tracing::info!(
                source = source_id,
                removed = report.removed.len(),
                added = report.added.len(),
                updated = report.updated.len(),
                failures = report.failures.len(),
                "reconciled"
            );
        }
        report
    }

    fn reload_if_changed(
        &self,
        engine: &Engine,
        source: &dyn DefinitionSource,
        id: &str,
    ) -> Result<bool, SourceError> {
        let Some(current) = source.version(id)? else {
            return Ok(false);
        };
        let Some(loaded) = engine.interpreter().workflow(id) else {
            return Ok(false);
        };
        if loaded.version == current {
            return Ok(false);
        }

        tracing::info!(
            workflow_id = %id,
            from = %loaded.version,
            to = %current,
            "workflow version changed"
        );
        // Loaded before removal so a failed read keeps the running version
        let definition = load(source, id)?;
        engine.interpreter().remove_workflow(id);
        engine.interpreter().add_workflow(definition);
        Ok(true)
    }
}

fn load(source: &dyn DefinitionSource, id: &str) -> Result<WorkflowDefinition, SourceError> {
    let mut definition = source.load(id)?;
    if definition.id.is_empty() {
        definition.id = id.to_string();
    }
    Ok(definition)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
