// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative workflow definitions
//!
//! Definitions are plain data: they deserialize from any self-describing
//! format and are never mutated after loading, except for the subscriber
//! slot a binding carries while its workflow is active.

pub mod args;

use crate::events::SubscriberId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// Argument map carried by condition and action definitions
pub type Args = Map<String, Value>;

/// A workflow: gate, work, and the topics that trigger it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub bindings: Vec<BindingDefinition>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_condition(mut self, condition: ConditionDefinition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: ActionDefinition) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_binding(mut self, binding: BindingDefinition) -> Self {
        self.bindings.push(binding);
        self
    }
}

/// Declarative condition: type identifier, arguments, nested children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Args,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConditionDefinition>,
}

impl ConditionDefinition {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            args: Args::new(),
            children: Vec::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.args.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: ConditionDefinition) -> Self {
        self.children.push(child);
        self
    }
}

/// Declarative action: type identifier and arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Args,
}

impl ActionDefinition {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            args: Args::new(),
        }
    }

    pub fn with_arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.args.insert(name.to_string(), value.into());
        self
    }
}

/// Association of a workflow with a bus topic
///
/// Clones share the subscriber slot, so a binding handed out by a
/// `BindingFactory` records its subscription on the loaded definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingDefinition {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub ignore_cancelled: bool,
    #[serde(skip)]
    subscriber: Arc<Mutex<Option<SubscriberId>>>,
}

fn enabled_default() -> bool {
    true
}

impl BindingDefinition {
    pub fn new(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            environment: String::new(),
            priority: 0,
            enabled: true,
            ignore_cancelled: false,
            subscriber: Arc::default(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_ignore_cancelled(mut self, ignore_cancelled: bool) -> Self {
        self.ignore_cancelled = ignore_cancelled;
        self
    }

    /// Subscriber id recorded when the owning workflow was activated
    pub fn subscriber(&self) -> Option<SubscriberId> {
        self.subscriber
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_subscriber(&self, id: Option<SubscriberId>) {
        *self.subscriber.lock().unwrap_or_else(|e| e.into_inner()) = id;
    }

    /// Clear the slot, returning what it held
    pub fn take_subscriber(&self) -> Option<SubscriberId> {
        self.subscriber
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl PartialEq for BindingDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.topic == other.topic
            && self.environment == other.environment
            && self.priority == other.priority
            && self.enabled == other.enabled
            && self.ignore_cancelled == other.ignore_cancelled
    }
}

/// Bootstrap work run once per definition source at engine start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitializerDefinition {
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
