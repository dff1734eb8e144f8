// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine context shared by every component and behavior
//!
//! `Engine` is a cheap handle over engine-owned state: the bus, registry,
//! scheduler, resolver, resolution caches, interpreter and definition
//! sources. Components that live inside the engine hold a `WeakEngine` so
//! the state can be dropped once the last handle goes away.

mod builder;

pub use builder::{EngineBuilder, EngineError};

use crate::config::{EngineConfig, WorkflowSourceConfig};
use crate::events::EventBus;
use crate::factory::{ActionCache, BindingFactory, ConditionCache};
use crate::interpreter::{chain, Interpreter};
use crate::payload::{Payload, WORKFLOW_ID, WORKFLOW_SOURCE};
use crate::reconcile::SourceMonitor;
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::source::{DefinitionSource, SourceCatalog, SourceError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

pub(crate) struct EngineInner {
    config: EngineConfig,
    bus: EventBus,
    registry: Registry,
    scheduler: Scheduler,
    resolver: Arc<dyn Resolver>,
    conditions: ConditionCache,
    actions: ActionCache,
    bindings: Arc<dyn BindingFactory>,
    interpreter: Interpreter,
    sources: SourceCatalog,
    monitors: Mutex<HashMap<String, TimerHandle>>,
}

/// Handle to a running engine
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

/// Non-owning engine handle for components stored inside the engine
#[derive(Clone, Default)]
pub struct WeakEngine(Weak<EngineInner>);

impl WeakEngine {
    pub fn upgrade(&self) -> Option<Engine> {
        self.0.upgrade().map(|inner| Engine { inner })
    }
}

impl fmt::Debug for WeakEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakEngine")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

impl Engine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.inner.resolver
    }

    pub fn conditions(&self) -> &ConditionCache {
        &self.inner.conditions
    }

    pub fn actions(&self) -> &ActionCache {
        &self.inner.actions
    }

    pub fn bindings(&self) -> &Arc<dyn BindingFactory> {
        &self.inner.bindings
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.inner.interpreter
    }

    pub fn sources(&self) -> &SourceCatalog {
        &self.inner.sources
    }

    /// Definition source for a configured source id
    pub fn source(&self, id: &str) -> Result<Arc<dyn DefinitionSource>, SourceError> {
        self.inner.sources.get(id)
    }

    /// Fresh payload owned by this engine
    pub fn payload(&self) -> Payload {
        Payload::new(self)
    }

    /// Publish on the engine's bus
    pub fn publish(&self, topic: &str, payload: &Payload) {
        self.inner.bus.publish(topic, payload);
    }

    /// Run every configured source's initializers
    ///
    /// Each initializer's conditions gate its actions. A source that cannot
    /// be built, or whose initializers cannot be read, is logged and
    /// skipped.
    pub fn initialize(&self) {
        for config in self.inner.sources.configs() {
            tracing::info!(source = %config.id, kind = %config.kind, "initializing source");
            let source = match self.inner.sources.instantiate(config) {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(source = %config.id, error = %e, "source unavailable");
                    continue;
                }
            };
            let initializers = match source.initializers() {
                Ok(initializers) => initializers,
                Err(e) => {
                    tracing::error!(source = %config.id, error = %e, "failed to read initializers");
                    continue;
                }
            };

            let payload = Payload::new(self)
                .with(WORKFLOW_SOURCE, config.clone())
                .with(WORKFLOW_ID, config.id.clone());
            for (index, initializer) in initializers.iter().enumerate() {
                let owner = format!("{}/initializer-{index}", config.id);
                if chain::gate(self, &owner, &initializer.conditions, &payload) {
                    chain::run(self, &owner, &initializer.actions, &payload);
                }
            }
        }
    }

    /// Start reconciling `source` every `interval`, replacing any monitor
    /// already running for the same source id
    pub fn monitor_source(
        &self,
        source: &WorkflowSourceConfig,
        interval: Duration,
    ) -> Result<(), EngineError> {
        let monitor = SourceMonitor::new(
            self.downgrade(),
            source.clone(),
            self.inner.config.reconcile.strategy,
        );
        let timer = self
            .inner
            .scheduler
            .schedule_repeating(Duration::ZERO, interval, move || {
                monitor.tick();
            })?;

        let previous = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source.id.clone(), timer);
        if let Some(previous) = previous {
            previous.cancel();
            tracing::info!(source = %source.id, "replaced source monitor");
        }
        tracing::info!(source = %source.id, interval = ?interval, "monitoring source");
        Ok(())
    }

    /// Ids of sources with a running monitor
    pub fn monitored_sources(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Stop a source's monitor; returns whether one was running
    pub fn stop_monitor(&self, source_id: &str) -> bool {
        let removed = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(source_id);
        match removed {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel monitors and every other scheduled timer
    pub fn shutdown(&self) {
        let monitors: Vec<TimerHandle> = self
            .inner
            .monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, timer)| timer)
            .collect();
        for timer in monitors {
            timer.cancel();
        }
        self.inner.scheduler.shutdown();
        tracing::info!("engine shut down");
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("workflows", &self.inner.interpreter.workflow_ids().len())
            .field("sources", &self.inner.sources.configs().len())
            .field("monitors", &self.monitored_sources())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
