// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry and payload actions

use crate::values;
use composer_core::payload::{REGISTRY_TTL, REGISTRY_VALUE};
use composer_core::workflow::args;
use composer_core::{
    Action, AnyValue, Args, ConstructionError, Engine, ExecutionError, Payload, WeakEngine,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Store a value under a key, optionally expiring
///
/// Key, value and ttl come from the payload's `registry.*` attributes first,
/// then from the `key`, `value` and `ttl` arguments. With no value the key is
/// removed. JSON strings are stored as `String`, other JSON as `Value`.
pub struct RegistrySet {
    engine: WeakEngine,
    key: Option<String>,
    value: Option<AnyValue>,
    ttl: Option<Duration>,
}

impl RegistrySet {
    pub fn new(engine: &Engine, arguments: &Args) -> Self {
        let ttl = match args::duration(arguments, "ttl") {
            Ok(ttl) => ttl,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring registry.set ttl");
                None
            }
        };
        Self {
            engine: engine.downgrade(),
            key: values::key_arg(arguments),
            value: arguments.get("value").and_then(stored),
            ttl,
        }
    }

    fn ttl(&self, payload: &Payload) -> Option<Duration> {
        match payload.get_as::<Duration>(REGISTRY_TTL) {
            Some(ttl) if ttl.is_zero() => {
                tracing::warn!("ignoring non-positive registry.ttl attribute");
                self.ttl
            }
            Some(ttl) => Some(*ttl),
            None => self.ttl,
        }
    }
}

fn stored(value: &Value) -> Option<AnyValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Arc::new(s.clone())),
        other => Some(Arc::new(other.clone())),
    }
}

impl Action for RegistrySet {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        if payload.is_cancelled() {
            return Ok(());
        }
        let Some(key) = values::key(payload, self.key.as_deref()) else {
            tracing::warn!("registry.set without a key, skipping");
            return Ok(());
        };
        let engine = values::engine(payload, &self.engine).ok_or(ExecutionError::Detached)?;
        let value = payload.get(REGISTRY_VALUE).or_else(|| self.value.clone());
        let ttl = self.ttl(payload);
        tracing::debug!(key, present = value.is_some(), ?ttl, "registry.set");
        engine
            .registry()
            .set_entry(&key, value, ttl)
            .map_err(|e| ExecutionError::failed(e.to_string()))
    }
}

/// Remove a key
pub struct RegistryRemove {
    engine: WeakEngine,
    key: Option<String>,
}

impl RegistryRemove {
    pub fn new(engine: &Engine, arguments: &Args) -> Self {
        Self {
            engine: engine.downgrade(),
            key: values::key_arg(arguments),
        }
    }
}

impl Action for RegistryRemove {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        if payload.is_cancelled() {
            return Ok(());
        }
        let Some(key) = values::key(payload, self.key.as_deref()) else {
            tracing::warn!("registry.remove without a key, skipping");
            return Ok(());
        };
        let engine = values::engine(payload, &self.engine).ok_or(ExecutionError::Detached)?;
        engine.registry().remove(&key);
        Ok(())
    }
}

/// Drop every registry entry
pub struct RegistryClear {
    engine: WeakEngine,
}

impl RegistryClear {
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: engine.downgrade(),
        }
    }
}

impl Action for RegistryClear {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        if payload.is_cancelled() {
            return Ok(());
        }
        let engine = values::engine(payload, &self.engine).ok_or(ExecutionError::Detached)?;
        engine.registry().clear();
        Ok(())
    }
}

/// Copy a registry value into a payload attribute
pub struct RegistryPopulate {
    engine: WeakEngine,
    key: String,
    field: String,
}

impl RegistryPopulate {
    pub fn new(engine: &Engine, arguments: &Args) -> Result<Self, ConstructionError> {
        Ok(Self {
            engine: engine.downgrade(),
            key: args::require_string(arguments, "key")?,
            field: args::require_string(arguments, "field")?,
        })
    }
}

impl Action for RegistryPopulate {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        if payload.is_cancelled() {
            return Ok(());
        }
        let engine = values::engine(payload, &self.engine).ok_or(ExecutionError::Detached)?;
        match engine.registry().get(&self.key) {
            Some(value) => payload.insert_value(self.field.clone(), value),
            None => {
                tracing::debug!(key = %self.key, field = %self.field, "nothing to populate");
            }
        }
        Ok(())
    }
}

/// Cancel the payload so later subscribers skip it
pub struct CancelPayload;

impl Action for CancelPayload {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        payload.cancel();
        Ok(())
    }
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
