// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolution caches: declarative definition in, shared live behavior out
//!
//! A cache is keyed by the structural value of a definition (its canonical
//! JSON form), so equal definitions share one instance for the lifetime of
//! the engine. Creation never fails loudly: every problem is logged and the
//! caller gets `None`.

mod binding;

pub use binding::{BindingFactory, DefaultBindingFactory};

use crate::behavior::{Action, Condition, ConstructionError};
use crate::engine::{Engine, WeakEngine};
use crate::resolver::{Behavior, ResolutionError, Resolver};
use crate::unwind;
use crate::workflow::{ActionDefinition, ConditionDefinition};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Why a definition did not produce a behavior
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("definition cannot be keyed: {0}")]
    Unkeyable(#[from] serde_json::Error),
    #[error("engine is no longer running")]
    Detached,
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("'{type_id}' is a {found}, expected a {expected}")]
    WrongKind {
        type_id: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("failed to construct '{type_id}': {source}")]
    Construction {
        type_id: String,
        source: ConstructionError,
    },
    #[error("factory for '{type_id}' panicked: {message}")]
    Panicked { type_id: String, message: String },
}

/// A definition the caches know how to turn into a behavior
pub trait Definition: Serialize + Send + Sync + 'static {
    type Output: ?Sized + Send + Sync + 'static;

    /// Behavior kind this definition expects, for diagnostics
    const KIND: &'static str;

    fn type_id(&self) -> &str;

    /// Build through the resolved factory, failing if it is the wrong kind
    fn construct(
        &self,
        behavior: Behavior,
        engine: &Engine,
    ) -> Result<Arc<Self::Output>, CreateError>;
}

impl Definition for ConditionDefinition {
    type Output = dyn Condition;
    const KIND: &'static str = "condition";

    fn type_id(&self) -> &str {
        &self.type_id
    }

    fn construct(
        &self,
        behavior: Behavior,
        engine: &Engine,
    ) -> Result<Arc<dyn Condition>, CreateError> {
        match behavior {
            Behavior::Condition(factory) => {
                factory(engine, self).map_err(|source| CreateError::Construction {
                    type_id: self.type_id.clone(),
                    source,
                })
            }
            other => Err(CreateError::WrongKind {
                type_id: self.type_id.clone(),
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }
}

impl Definition for ActionDefinition {
    type Output = dyn Action;
    const KIND: &'static str = "action";

    fn type_id(&self) -> &str {
        &self.type_id
    }

    fn construct(
        &self,
        behavior: Behavior,
        engine: &Engine,
    ) -> Result<Arc<dyn Action>, CreateError> {
        match behavior {
            Behavior::Action(factory) => {
                factory(engine, self).map_err(|source| CreateError::Construction {
                    type_id: self.type_id.clone(),
                    source,
                })
            }
            other => Err(CreateError::WrongKind {
                type_id: self.type_id.clone(),
                expected: Self::KIND,
                found: other.kind(),
            }),
        }
    }
}

/// Memoizing factory for one kind of definition
pub struct ResolutionCache<D: Definition> {
    resolver: Arc<dyn Resolver>,
    engine: WeakEngine,
    entries: RwLock<HashMap<String, Arc<D::Output>>>,
}

/// Cache of live conditions
pub type ConditionCache = ResolutionCache<ConditionDefinition>;
/// Cache of live actions
pub type ActionCache = ResolutionCache<ActionDefinition>;

impl<D: Definition> ResolutionCache<D> {
    pub fn new(resolver: Arc<dyn Resolver>, engine: WeakEngine) -> Self {
        Self {
            resolver,
            engine,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Shared behavior for `definition`, or `None` (logged) if it cannot be built
    pub fn create(&self, definition: &D) -> Option<Arc<D::Output>> {
        match self.try_create(definition) {
            Ok(behavior) => Some(behavior),
            Err(e) => {
                tracing::error!(
                    kind = D::KIND,
                    type_id = definition.type_id(),
                    error = %e,
                    "could not create behavior"
                );
                None
            }
        }
    }

    pub fn try_create(&self, definition: &D) -> Result<Arc<D::Output>, CreateError> {
        let key = serde_json::to_string(definition)?;

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        let engine = self.engine.upgrade().ok_or(CreateError::Detached)?;
        let behavior = self.resolver.resolve(definition.type_id())?;
        // Built outside the lock: factories may create their children
        // through this same cache
        let created = unwind::contain(|| definition.construct(behavior, &engine)).map_err(
            |message| CreateError::Panicked {
                type_id: definition.type_id().to_string(),
                message,
            },
        )??;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // A concurrent creator may have won; keep the first instance
        let shared = entries.entry(key).or_insert(created);
        tracing::debug!(
            kind = D::KIND,
            type_id = definition.type_id(),
            "created behavior"
        );
        Ok(Arc::clone(shared))
    }

    /// Number of memoized behaviors
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized behavior
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
