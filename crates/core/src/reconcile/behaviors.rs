// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behaviors that start reconciliation from a source's initializers

use crate::behavior::{Action, Condition, EvaluationError, ExecutionError};
use crate::config::WorkflowSourceConfig;
use crate::engine::{Engine, WeakEngine};
use crate::payload::{Payload, WORKFLOW_SOURCE};
use crate::resolver::PluginResolver;
use crate::workflow::args;
use std::sync::Arc;
use std::time::Duration;

pub const SOURCE_AVAILABLE: &str = "source.available";
pub const SOURCE_MONITOR: &str = "source.monitor";

/// Register the reconciliation behaviors
pub fn register(resolver: &mut PluginResolver) {
    resolver
        .register_condition(SOURCE_AVAILABLE, |engine, _| {
            Ok(Arc::new(SourceAvailable::new(engine)) as Arc<dyn Condition>)
        })
        .register_action(SOURCE_MONITOR, |engine, definition| {
            let interval = args::duration(&definition.args, "interval")?;
            Ok(Arc::new(MonitorSource::new(engine, interval)) as Arc<dyn Action>)
        });
}

fn engine_for(payload: &Payload, fallback: &WeakEngine) -> Option<Engine> {
    payload.engine().cloned().or_else(|| fallback.upgrade())
}

/// True when the payload names a source the engine can open
pub struct SourceAvailable {
    engine: WeakEngine,
}

impl SourceAvailable {
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: engine.downgrade(),
        }
    }
}

impl Condition for SourceAvailable {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        let Some(config) = payload.get_as::<WorkflowSourceConfig>(WORKFLOW_SOURCE) else {
            tracing::debug!("payload carries no workflow source");
            return Ok(false);
        };
        let engine = engine_for(payload, &self.engine).ok_or(EvaluationError::Detached)?;
        match engine.sources().instantiate(&config) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(source = %config.id, error = %e, "source not available");
                Ok(false)
            }
        }
    }
}

/// Schedules a repeating reconciliation of the payload's source
pub struct MonitorSource {
    engine: WeakEngine,
    interval: Option<Duration>,
}

impl MonitorSource {
    pub fn new(engine: &Engine, interval: Option<Duration>) -> Self {
        Self {
            engine: engine.downgrade(),
            interval,
        }
    }
}

impl Action for MonitorSource {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        if payload.is_cancelled() {
            return Ok(());
        }
        let config = payload
            .get_as::<WorkflowSourceConfig>(WORKFLOW_SOURCE)
            .ok_or_else(|| ExecutionError::failed("payload carries no workflow source"))?;
        let engine = engine_for(payload, &self.engine).ok_or(ExecutionError::Detached)?;
        let interval = self.interval.unwrap_or(engine.config().reconcile.interval);
        engine
            .monitor_source(&config, interval)
            .map_err(|e| ExecutionError::failed(e.to_string()))
    }
}
