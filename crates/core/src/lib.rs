// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! composer-core: runtime core of the Composer workflow engine
//!
//! This crate provides:
//! - A priority-ordered, cancellation-aware event bus
//! - An interpreter that binds workflow definitions to bus topics
//! - Resolution caches that turn declarative definitions into live behaviors
//! - A TTL-scoped registry for state shared between behaviors
//! - Source reconciliation that keeps loaded workflows in step with a store

pub mod clock;
pub mod id;

pub mod behavior;
pub mod config;
pub mod engine;
pub mod events;
pub mod factory;
pub mod interpreter;
pub mod payload;
pub mod reconcile;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod source;
pub mod workflow;

mod unwind;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-exports
pub use behavior::{Action, Condition, ConstructionError, EvaluationError, ExecutionError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    BindingsConfig, ConfigError, EngineConfig, ReconcileConfig, ReconcileStrategy,
    WorkflowSourceConfig,
};
pub use engine::{Engine, EngineBuilder, EngineError, WeakEngine};
pub use events::{EventBus, HandlerError, SubscriberId};
pub use factory::{ActionCache, BindingFactory, ConditionCache, DefaultBindingFactory};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use interpreter::Interpreter;
pub use payload::{AnyValue, Payload};
pub use reconcile::{ReconcileReport, SourceMonitor};
pub use registry::{Registry, RegistryError};
pub use resolver::{Behavior, PluginResolver, ResolutionError, Resolver};
pub use scheduler::{Scheduler, SchedulerError, TimerHandle};
pub use source::{DefinitionSource, MemorySource, SourceError, SourceFactory};
pub use workflow::{
    ActionDefinition, Args, BindingDefinition, ConditionDefinition, InitializerDefinition,
    WorkflowDefinition,
};
