// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event payload delivered to subscribers for one publish call

use crate::engine::Engine;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Opaque shared value stored in payload attributes and the registry
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Attribute holding the id of the workflow an event concerns
pub const WORKFLOW_ID: &str = "workflow.id";
/// Attribute holding the `WorkflowSourceConfig` during initialization
pub const WORKFLOW_SOURCE: &str = "workflow.source";
pub const REGISTRY_KEY: &str = "registry.key";
pub const REGISTRY_VALUE: &str = "registry.value";
pub const REGISTRY_TTL: &str = "registry.ttl";

/// Topic published after a workflow enters the interpreter
pub const WORKFLOW_ADDED: &str = "workflow.added";
/// Topic published before a workflow leaves the interpreter
pub const WORKFLOW_REMOVED: &str = "workflow.removed";

/// Mutable, cancellable envelope shared by every handler of one publish
pub struct Payload {
    engine: Option<Engine>,
    attributes: RwLock<HashMap<String, AnyValue>>,
    cancelled: AtomicBool,
}

impl Payload {
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: Some(engine.clone()),
            attributes: RwLock::new(HashMap::new()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Payload not owned by any engine. Behaviors that need engine state
    /// treat it as unusable.
    pub fn detached() -> Self {
        Self {
            engine: None,
            attributes: RwLock::new(HashMap::new()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Builder-style attribute insertion
    pub fn with<T: Any + Send + Sync>(self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.insert_value(key, Arc::new(value));
    }

    pub fn insert_value(&self, key: impl Into<String>, value: AnyValue) {
        self.attributes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<AnyValue> {
        self.attributes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
    }

    pub fn get(&self, key: &str) -> Option<AnyValue> {
        self.attributes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Typed attribute lookup; `None` when absent or of another type
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key)?.downcast::<T>().ok()
    }

    /// String view of an attribute stored as `String`, `&'static str`, or a
    /// JSON string
    pub fn text(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        if let Some(s) = value.downcast_ref::<String>() {
            return Some(s.clone());
        }
        if let Some(s) = value.downcast_ref::<&'static str>() {
            return Some((*s).to_string());
        }
        match value.downcast_ref::<serde_json::Value>() {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.attributes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn set_cancelled(&self, cancelled: bool) {
        self.cancelled.store(cancelled, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();
        keys.sort();
        f.debug_struct("Payload")
            .field("attributes", &keys)
            .field("cancelled", &self.is_cancelled())
            .field("attached", &self.engine.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
