// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite and registry conditions

use crate::values;
use composer_core::payload::REGISTRY_VALUE;
use composer_core::workflow::args;
use composer_core::{
    Args, Condition, ConditionDefinition, ConstructionError, Engine, EvaluationError, Payload,
    WeakEngine,
};
use serde_json::Value;
use std::sync::Arc;

/// Children of a composite, resolved when the composite is evaluated
///
/// Resolving late lets a composite be built before the plugins its children
/// name are registered, and keeps the engine's cache as the single owner.
struct Children {
    engine: WeakEngine,
    definitions: Vec<ConditionDefinition>,
}

impl Children {
    fn new(engine: &Engine, definition: &ConditionDefinition) -> Self {
        Self {
            engine: engine.downgrade(),
            definitions: definition.children.clone(),
        }
    }

    /// Resolved children; unresolvable ones are left out
    fn resolve(&self, payload: &Payload) -> Result<Vec<Arc<dyn Condition>>, EvaluationError> {
        let engine = values::engine(payload, &self.engine).ok_or(EvaluationError::Detached)?;
        Ok(self
            .definitions
            .iter()
            .filter_map(|def| engine.interpreter().condition(def))
            .collect())
    }
}

/// True when every child is true; no children is true
pub struct All {
    children: Children,
}

impl All {
    pub fn new(engine: &Engine, definition: &ConditionDefinition) -> Self {
        Self {
            children: Children::new(engine, definition),
        }
    }
}

impl Condition for All {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        for child in self.children.resolve(payload)? {
            if !child.evaluate(payload)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True when some child is true; no children is false
pub struct Any {
    children: Children,
}

impl Any {
    pub fn new(engine: &Engine, definition: &ConditionDefinition) -> Self {
        Self {
            children: Children::new(engine, definition),
        }
    }
}

impl Condition for Any {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        for child in self.children.resolve(payload)? {
            if child.evaluate(payload)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Negates its single child
pub struct Not {
    children: Children,
}

impl Not {
    pub fn new(
        engine: &Engine,
        definition: &ConditionDefinition,
    ) -> Result<Self, ConstructionError> {
        if definition.children.len() != 1 {
            return Err(ConstructionError::InvalidArgument {
                name: "children".to_string(),
                reason: format!("expected exactly one child, found {}", definition.children.len()),
            });
        }
        Ok(Self {
            children: Children::new(engine, definition),
        })
    }
}

impl Condition for Not {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        match self.children.resolve(payload)?.first() {
            Some(child) => Ok(!child.evaluate(payload)?),
            None => Err(EvaluationError::failed("child condition could not be resolved")),
        }
    }
}

/// Registry holds the key, optionally with a given value and JSON kind
pub struct RegistryContains {
    engine: WeakEngine,
    key: Option<String>,
    value: Option<Value>,
    kind: Option<String>,
}

impl RegistryContains {
    pub fn new(engine: &Engine, arguments: &Args) -> Self {
        Self {
            engine: engine.downgrade(),
            key: values::key_arg(arguments),
            value: arguments.get("value").filter(|v| !v.is_null()).cloned(),
            kind: args::string(arguments, "type"),
        }
    }

    fn expected(&self, payload: &Payload) -> Option<Value> {
        payload
            .get(REGISTRY_VALUE)
            .and_then(|v| values::as_json(&v))
            .or_else(|| self.value.clone())
    }
}

impl Condition for RegistryContains {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        let Some(key) = values::key(payload, self.key.as_deref()) else {
            tracing::warn!("registry.contains without a key");
            return Ok(false);
        };
        let engine = values::engine(payload, &self.engine).ok_or(EvaluationError::Detached)?;
        let Some(stored) = engine.registry().get(&key) else {
            return Ok(false);
        };

        let expected = self.expected(payload);
        if self.kind.is_none() && expected.is_none() {
            return Ok(true);
        }

        let Some(actual) = values::as_json(&stored) else {
            tracing::debug!(key, "registry value has no JSON form, cannot compare");
            return Ok(false);
        };
        if let Some(kind) = &self.kind {
            if values::kind(&actual) != kind {
                return Ok(false);
            }
        }
        Ok(match expected {
            Some(expected) => values::same(&values::coerce(&expected, &actual), &actual),
            None => true,
        })
    }
}

/// Registry does not hold the key
pub struct RegistryMissing {
    engine: WeakEngine,
    key: Option<String>,
}

impl RegistryMissing {
    pub fn new(engine: &Engine, arguments: &Args) -> Self {
        Self {
            engine: engine.downgrade(),
            key: values::key_arg(arguments),
        }
    }
}

impl Condition for RegistryMissing {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        if payload.is_cancelled() {
            return Ok(false);
        }
        let Some(key) = values::key(payload, self.key.as_deref()) else {
            tracing::warn!("registry.missing without a key");
            return Ok(false);
        };
        let engine = values::engine(payload, &self.engine).ok_or(EvaluationError::Detached)?;
        Ok(!engine.registry().contains_key(&key))
    }
}

#[cfg(test)]
#[path = "conditions_tests.rs"]
mod tests;
