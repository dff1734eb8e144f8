// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping from a behavior type identifier to its factory
//!
//! Hosts register named factories at startup; definitions refer to them by
//! `type`. Resolution can be replaced wholesale by supplying another
//! `Resolver` to the engine builder.

use crate::behavior::{Action, Condition, ConstructionError};
use crate::engine::Engine;
use crate::workflow::{ActionDefinition, ConditionDefinition};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Builds a condition from the engine and its full definition
pub type ConditionFactory = Arc<
    dyn Fn(&Engine, &ConditionDefinition) -> Result<Arc<dyn Condition>, ConstructionError>
        + Send
        + Sync,
>;

/// Builds an action from the engine and its full definition
pub type ActionFactory = Arc<
    dyn Fn(&Engine, &ActionDefinition) -> Result<Arc<dyn Action>, ConstructionError>
        + Send
        + Sync,
>;

/// What a type identifier resolves to
#[derive(Clone)]
pub enum Behavior {
    Condition(ConditionFactory),
    Action(ActionFactory),
}

impl Behavior {
    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::Condition(_) => "condition",
            Behavior::Action(_) => "action",
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behavior::{}", self.kind())
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unknown behavior type '{0}'")]
    Unknown(String),
}

/// Looks up behavior factories by type identifier
pub trait Resolver: Send + Sync {
    fn resolve(&self, type_id: &str) -> Result<Behavior, ResolutionError>;
}

/// Resolver backed by a table of registered factories
#[derive(Clone, Default)]
pub struct PluginResolver {
    behaviors: BTreeMap<String, Behavior>,
}

impl PluginResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a condition factory under `type_id`, replacing any previous one
    pub fn register_condition<F>(&mut self, type_id: &str, factory: F) -> &mut Self
    where
        F: Fn(&Engine, &ConditionDefinition) -> Result<Arc<dyn Condition>, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(type_id, Behavior::Condition(Arc::new(factory)))
    }

    /// Register an action factory under `type_id`, replacing any previous one
    pub fn register_action<F>(&mut self, type_id: &str, factory: F) -> &mut Self
    where
        F: Fn(&Engine, &ActionDefinition) -> Result<Arc<dyn Action>, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(type_id, Behavior::Action(Arc::new(factory)))
    }

    pub fn register(&mut self, type_id: &str, behavior: Behavior) -> &mut Self {
        if let Some(previous) = self.behaviors.insert(type_id.to_string(), behavior) {
            tracing::warn!(
                type_id,
                replaced = previous.kind(),
                "behavior type re-registered"
            );
        }
        self
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.behaviors.contains_key(type_id)
    }

    /// Registered identifiers in sorted order
    pub fn type_ids(&self) -> Vec<&str> {
        self.behaviors.keys().map(String::as_str).collect()
    }
}

impl Resolver for PluginResolver {
    fn resolve(&self, type_id: &str) -> Result<Behavior, ResolutionError> {
        self.behaviors
            .get(type_id)
            .cloned()
            .ok_or_else(|| ResolutionError::Unknown(type_id.to_string()))
    }
}

impl fmt::Debug for PluginResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginResolver")
            .field("types", &self.type_ids())
            .finish()
    }
}
