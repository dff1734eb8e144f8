// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine construction

use super::{Engine, EngineInner, WeakEngine};
use crate::config::{ConfigError, EngineConfig, WorkflowSourceConfig};
use crate::events::EventBus;
use crate::factory::{BindingFactory, DefaultBindingFactory, ResolutionCache};
use crate::interpreter::Interpreter;
use crate::reconcile;
use crate::registry::Registry;
use crate::resolver::{Behavior, PluginResolver, ResolutionError, Resolver};
use crate::scheduler::{Scheduler, SchedulerError};
use crate::source::{DefinitionSource, SourceCatalog, SourceError, SourceFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no tokio runtime: build inside a runtime or call with_runtime")]
    NoRuntime,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Assembles an `Engine` from configuration and host-supplied extensions
pub struct EngineBuilder {
    config: EngineConfig,
    runtime: Option<Handle>,
    plugins: PluginResolver,
    resolver: Option<Arc<dyn Resolver>>,
    bindings: Arc<dyn BindingFactory>,
    kinds: HashMap<String, SourceFactory>,
    sources: Vec<(WorkflowSourceConfig, Arc<dyn DefinitionSource>)>,
}

impl EngineBuilder {
    pub(crate) fn new(config: EngineConfig) -> Self {
        let mut plugins = PluginResolver::new();
        reconcile::register(&mut plugins);
        Self {
            config,
            runtime: None,
            plugins,
            resolver: None,
            bindings: Arc::new(DefaultBindingFactory),
            kinds: HashMap::new(),
            sources: Vec::new(),
        }
    }

    /// Runtime for timers; defaults to the runtime `build` is called in
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Register condition and action factories
    pub fn with_plugins(mut self, install: impl FnOnce(&mut PluginResolver)) -> Self {
        install(&mut self.plugins);
        self
    }

    /// Resolve types through `resolver` first, falling back to registered
    /// plugins and the built-in reconciliation behaviors
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_binding_factory(mut self, factory: Arc<dyn BindingFactory>) -> Self {
        self.bindings = factory;
        self
    }

    /// Register a factory for sources of `kind`
    pub fn with_source_kind<F>(mut self, kind: &str, factory: F) -> Self
    where
        F: Fn(&WorkflowSourceConfig) -> Result<Arc<dyn DefinitionSource>, SourceError>
            + Send
            + Sync
            + 'static,
    {
        self.kinds.insert(kind.to_string(), Arc::new(factory));
        self
    }

    /// Add a source instance directly; its config joins the configured sources
    pub fn with_source(
        mut self,
        config: WorkflowSourceConfig,
        source: Arc<dyn DefinitionSource>,
    ) -> Self {
        self.sources.push((config, source));
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let handle = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| EngineError::NoRuntime)?,
        };

        let mut configs = self.config.sources.clone();
        let mut instances = HashMap::new();
        for (config, source) in self.sources {
            if !configs.iter().any(|c| c.id == config.id) {
                configs.push(config.clone());
            }
            instances.insert(config.id, source);
        }
        let mut config = self.config;
        config.sources = configs.clone();
        config.validate()?;

        let plugins: Arc<dyn Resolver> = Arc::new(self.plugins);
        let resolver: Arc<dyn Resolver> = match self.resolver {
            Some(primary) => Arc::new(Layered {
                primary,
                fallback: plugins,
            }),
            None => plugins,
        };

        let scheduler = Scheduler::new(handle);
        let honor_enabled = config.bindings.honor_enabled;
        let bindings = self.bindings;
        let sources = SourceCatalog::new(configs, self.kinds, instances);

        let inner = Arc::new_cyclic(|weak| {
            let engine = WeakEngine(weak.clone());
            EngineInner {
                bus: EventBus::new(),
                registry: Registry::new(scheduler.clone()),
                conditions: ResolutionCache::new(Arc::clone(&resolver), engine.clone()),
                actions: ResolutionCache::new(Arc::clone(&resolver), engine.clone()),
                interpreter: Interpreter::new(engine, honor_enabled),
                scheduler,
                resolver,
                bindings,
                sources,
                config,
                monitors: Mutex::new(HashMap::new()),
            }
        });
        let engine = Engine { inner };
        engine.interpreter().attach(engine.bus());

        tracing::info!(
            sources = engine.sources().configs().len(),
            strategy = ?engine.config().reconcile.strategy,
            "engine built"
        );
        Ok(engine)
    }
}

/// Host resolver with the plugin table behind it
struct Layered {
    primary: Arc<dyn Resolver>,
    fallback: Arc<dyn Resolver>,
}

impl Resolver for Layered {
    fn resolve(&self, type_id: &str) -> Result<Behavior, ResolutionError> {
        self.primary
            .resolve(type_id)
            .or_else(|_| self.fallback.resolve(type_id))
    }
}
