// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow interpreter
//!
//! Owns the loaded workflow set and keeps each workflow's bindings
//! subscribed on the bus exactly while it is loaded. Activation and
//! deactivation go through the bus itself: `add_workflow` publishes
//! `workflow.added` and `remove_workflow` publishes `workflow.removed`,
//! handled at maximum priority regardless of cancellation.
//!
//! Each loaded version is bound at most once, and its subscriptions are
//! recorded against that exact version under the workflow map lock. A
//! binding that finishes subscribing after its version was replaced or
//! removed finds no matching entry and unsubscribes itself. Removal cancels
//! whatever was recorded after the removed handler ran.

pub(crate) mod chain;

use crate::behavior::{Action, Condition};
use crate::engine::{Engine, WeakEngine};
use crate::events::{EventBus, SubscriberId};
use crate::payload::{Payload, WORKFLOW_ADDED, WORKFLOW_ID, WORKFLOW_REMOVED};
use crate::workflow::{
    ActionDefinition, BindingDefinition, ConditionDefinition, WorkflowDefinition,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

pub struct Interpreter {
    engine: WeakEngine,
    workflows: RwLock<HashMap<String, Loaded>>,
    honor_enabled: bool,
    handlers: Mutex<Vec<(&'static str, SubscriberId)>>,
}

/// A loaded workflow and the subscriptions made on its behalf
struct Loaded {
    definition: Arc<WorkflowDefinition>,
    bound: bool,
    subscriptions: Vec<Subscription>,
}

struct Subscription {
    binding: BindingDefinition,
    id: SubscriberId,
}

impl Subscription {
    fn cancel(self, bus: &EventBus) {
        tracing::debug!(
            binding = %self.binding.id,
            topic = %self.binding.topic,
            subscriber = %self.id,
            "binding unsubscribed"
        );
        bus.unsubscribe(&self.binding.topic, &self.id);
        if self.binding.subscriber().as_ref() == Some(&self.id) {
            self.binding.set_subscriber(None);
        }
    }
}

impl Interpreter {
    pub(crate) fn new(engine: WeakEngine, honor_enabled: bool) -> Self {
        Self {
            engine,
            workflows: RwLock::new(HashMap::new()),
            honor_enabled,
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe the activation and deactivation handlers
    pub(crate) fn attach(&self, bus: &EventBus) {
        let weak = self.engine.clone();
        let added = bus.subscribe(WORKFLOW_ADDED, i32::MAX, true, move |payload| {
            if let Some((engine, workflow)) = lookup(&weak, payload) {
                engine.interpreter().bind(&engine, &workflow);
            }
            Ok(())
        });

        let weak = self.engine.clone();
        let removed = bus.subscribe(WORKFLOW_REMOVED, i32::MAX, true, move |payload| {
            if let Some((engine, workflow)) = lookup(&weak, payload) {
                engine.interpreter().unbind(&engine, &workflow);
            }
            Ok(())
        });

        tracing::debug!(added = %added, removed = %removed, "interpreter handlers subscribed");
        let mut handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers.push((WORKFLOW_ADDED, added));
        handlers.push((WORKFLOW_REMOVED, removed));
    }

    /// Subscriber ids of the activation and deactivation handlers
    pub fn handler_ids(&self) -> Vec<(&'static str, SubscriberId)> {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Load `definition`, replacing any workflow with the same id, and
    /// publish `workflow.added`
    pub fn add_workflow(&self, definition: WorkflowDefinition) {
        let workflow = Arc::new(definition);
        let id = workflow.id.clone();
        tracing::info!(workflow_id = %id, version = %workflow.version, "adding workflow");

        let previous = self
            .workflows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id.clone(),
                Loaded {
                    definition: Arc::clone(&workflow),
                    bound: false,
                    subscriptions: Vec::new(),
                },
            );

        let Some(engine) = self.engine.upgrade() else {
            tracing::warn!(workflow_id = %id, "engine stopped, workflow not bound");
            return;
        };
        if let Some(previous) = previous {
            tracing::info!(
                workflow_id = %id,
                version = %previous.definition.version,
                "removing bindings of replaced version"
            );
            for subscription in previous.subscriptions {
                subscription.cancel(engine.bus());
            }
        }
        let payload = Payload::new(&engine).with(WORKFLOW_ID, id);
        engine.bus().publish(WORKFLOW_ADDED, &payload);
    }

    /// Publish `workflow.removed`, then unload `id`
    pub fn remove_workflow(&self, id: &str) {
        tracing::info!(workflow_id = %id, "removing workflow");
        let engine = self.engine.upgrade();
        if let Some(engine) = &engine {
            let payload = Payload::new(engine).with(WORKFLOW_ID, id.to_string());
            engine.bus().publish(WORKFLOW_REMOVED, &payload);
        }
        let removed = self
            .workflows
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        // Bindings recorded after the removed handler ran
        if let (Some(engine), Some(removed)) = (engine, removed) {
            for subscription in removed.subscriptions {
                subscription.cancel(engine.bus());
            }
        }
    }

    pub fn workflow(&self, id: &str) -> Option<Arc<WorkflowDefinition>> {
        self.workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .map(|loaded| Arc::clone(&loaded.definition))
    }

    pub fn workflow_exists(&self, id: &str) -> bool {
        self.workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn workflows(&self) -> Vec<Arc<WorkflowDefinition>> {
        self.workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|loaded| Arc::clone(&loaded.definition))
            .collect()
    }

    pub fn workflow_ids(&self) -> Vec<String> {
        self.workflows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Binding to subscribe for `definition`, via the engine's binding factory
    pub fn binding(&self, definition: &BindingDefinition) -> Option<BindingDefinition> {
        let engine = self.engine.upgrade()?;
        match engine.bindings().create(definition) {
            Ok(binding) => Some(binding),
            Err(e) => {
                tracing::warn!(
                    binding = %definition.id,
                    error = %e,
                    "binding factory produced nothing"
                );
                None
            }
        }
    }

    /// Live condition for `definition`, via the condition cache
    pub fn condition(&self, definition: &ConditionDefinition) -> Option<Arc<dyn Condition>> {
        let created = self.engine.upgrade()?.conditions().create(definition);
        if created.is_none() {
            tracing::warn!(condition = %definition.type_id, "condition unavailable");
        }
        created
    }

    /// Live action for `definition`, via the action cache
    pub fn action(&self, definition: &ActionDefinition) -> Option<Arc<dyn Action>> {
        let created = self.engine.upgrade()?.actions().create(definition);
        if created.is_none() {
            tracing::warn!(action = %definition.type_id, "action unavailable");
        }
        created
    }

    fn bind(&self, engine: &Engine, workflow: &Arc<WorkflowDefinition>) {
        if !self.claim(workflow) {
            tracing::debug!(workflow_id = %workflow.id, "workflow already bound");
            return;
        }
        tracing::info!(workflow_id = %workflow.id, "registering bindings");
        for definition in &workflow.bindings {
            if self.honor_enabled && !definition.enabled {
                tracing::debug!(
                    workflow_id = %workflow.id,
                    binding = %definition.id,
                    "binding disabled"
                );
                continue;
            }
            let Some(binding) = self.binding(definition) else {
                continue;
            };

            let handler_workflow = Arc::clone(workflow);
            let weak = self.engine.clone();
            let id = engine.bus().subscribe(
                &binding.topic,
                binding.priority,
                binding.ignore_cancelled,
                move |payload| {
                    if let Some(engine) = weak.upgrade() {
                        handle(&engine, &handler_workflow, payload);
                    }
                    Ok(())
                },
            );
            tracing::debug!(
                workflow_id = %workflow.id,
                binding = %binding.id,
                topic = %binding.topic,
                subscriber = %id,
                "binding subscribed"
            );
            let subscription = Subscription { binding, id };
            if let Some(stale) = self.record(workflow, subscription) {
                tracing::debug!(
                    workflow_id = %workflow.id,
                    "workflow replaced or removed while binding"
                );
                stale.cancel(engine.bus());
            }
        }
    }

    /// Mark `workflow` as bound if it is the loaded version and nobody has
    /// bound it yet
    fn claim(&self, workflow: &Arc<WorkflowDefinition>) -> bool {
        let mut workflows = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        match workflows.get_mut(&workflow.id) {
            Some(loaded) if Arc::ptr_eq(&loaded.definition, workflow) && !loaded.bound => {
                loaded.bound = true;
                true
            }
            _ => false,
        }
    }

    /// Attach `subscription` to `workflow` if it is still the loaded version;
    /// otherwise hand it back for cancelling
    fn record(
        &self,
        workflow: &Arc<WorkflowDefinition>,
        subscription: Subscription,
    ) -> Option<Subscription> {
        let mut workflows = self.workflows.write().unwrap_or_else(|e| e.into_inner());
        match workflows.get_mut(&workflow.id) {
            Some(loaded) if Arc::ptr_eq(&loaded.definition, workflow) => {
                subscription
                    .binding
                    .set_subscriber(Some(subscription.id.clone()));
                loaded.subscriptions.push(subscription);
                None
            }
            _ => Some(subscription),
        }
    }

    fn unbind(&self, engine: &Engine, workflow: &Arc<WorkflowDefinition>) {
        tracing::info!(workflow_id = %workflow.id, "removing bindings");
        let subscriptions = {
            let mut workflows = self.workflows.write().unwrap_or_else(|e| e.into_inner());
            match workflows.get_mut(&workflow.id) {
                Some(loaded) if Arc::ptr_eq(&loaded.definition, workflow) => {
                    loaded.bound = false;
                    std::mem::take(&mut loaded.subscriptions)
                }
                _ => Vec::new(),
            }
        };
        for subscription in subscriptions {
            subscription.cancel(engine.bus());
        }
    }
}

/// Run a bound workflow's conditions, then its actions
fn handle(engine: &Engine, workflow: &WorkflowDefinition, payload: &Payload) {
    tracing::debug!(workflow_id = %workflow.id, "handling event");
    if chain::gate(engine, &workflow.id, &workflow.conditions, payload) {
        chain::run(engine, &workflow.id, &workflow.actions, payload);
    }
}

fn lookup(weak: &WeakEngine, payload: &Payload) -> Option<(Engine, Arc<WorkflowDefinition>)> {
    let engine = weak.upgrade()?;
    let id = payload.text(WORKFLOW_ID)?;
    let workflow = engine.interpreter().workflow(&id)?;
    Some((engine, workflow))
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
