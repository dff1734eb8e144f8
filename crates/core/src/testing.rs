// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording behaviors for tests
//!
//! `Recorder::install` registers a small catalog of conditions and actions
//! whose calls land in a shared log:
//!
//! | type | kind | effect |
//! |---|---|---|
//! | `test.true` / `test.false` | condition | constant answer |
//! | `test.check` | condition | logs `check:<label>`, answers arg `result` (default true) |
//! | `test.broken` | condition | returns an error |
//! | `test.record` | action | logs arg `label` (default `record`) |
//! | `test.fail` | action | logs `fail:<label>`, returns an error |
//! | `test.panic` | action | panics |
//! | `test.cancel` | action | cancels the payload |

use crate::behavior::{Action, Condition, ConstructionError, EvaluationError, ExecutionError};
use crate::engine::Engine;
use crate::payload::Payload;
use crate::resolver::PluginResolver;
use crate::workflow::{args, ConditionDefinition};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared log of behavior calls and factory invocations
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    constructions: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// How many behaviors the factories have built
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    fn push(&self, event: String) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn install(&self, resolver: &mut PluginResolver) {
        resolver.register_condition("test.true", constant(true, self.clone()));
        resolver.register_condition("test.false", constant(false, self.clone()));

        let rec = self.clone();
        resolver.register_condition("test.check", move |_, def| {
            rec.constructions.fetch_add(1, Ordering::SeqCst);
            let label = args::string(&def.args, "label").unwrap_or_else(|| "check".to_string());
            let result = args::boolean(&def.args, "result").unwrap_or(true);
            let log = rec.clone();
            let condition = move |_: &Payload| -> Result<bool, EvaluationError> {
                log.push(format!("check:{label}"));
                Ok(result)
            };
            Ok(Arc::new(condition) as Arc<dyn Condition>)
        });

        let rec = self.clone();
        resolver.register_condition("test.broken", move |_, _| {
            rec.constructions.fetch_add(1, Ordering::SeqCst);
            let condition = |_: &Payload| -> Result<bool, EvaluationError> {
                Err(EvaluationError::failed("broken condition"))
            };
            Ok(Arc::new(condition) as Arc<dyn Condition>)
        });

        let rec = self.clone();
        resolver.register_action("test.record", move |_, def| {
            rec.constructions.fetch_add(1, Ordering::SeqCst);
            let label = args::string(&def.args, "label").unwrap_or_else(|| "record".to_string());
            let log = rec.clone();
            let action = move |_: &Payload| -> Result<(), ExecutionError> {
                log.push(label.clone());
                Ok(())
            };
            Ok(Arc::new(action) as Arc<dyn Action>)
        });

        let rec = self.clone();
        resolver.register_action("test.fail", move |_, def| {
            rec.constructions.fetch_add(1, Ordering::SeqCst);
            let label = args::string(&def.args, "label").unwrap_or_else(|| "fail".to_string());
            let log = rec.clone();
            let action = move |_: &Payload| -> Result<(), ExecutionError> {
                log.push(format!("fail:{label}"));
                Err(ExecutionError::failed("failing action"))
            };
            Ok(Arc::new(action) as Arc<dyn Action>)
        });

        resolver.register_action("test.panic", |_, _| {
            Ok(Arc::new(PanickingAction) as Arc<dyn Action>)
        });

        resolver.register_action("test.cancel", |_, _| {
            let action = |payload: &Payload| -> Result<(), ExecutionError> {
                payload.cancel();
                Ok(())
            };
            Ok(Arc::new(action) as Arc<dyn Action>)
        });
    }
}

fn constant(
    answer: bool,
    rec: Recorder,
) -> impl Fn(&Engine, &ConditionDefinition) -> Result<Arc<dyn Condition>, ConstructionError>
       + Send
       + Sync
       + 'static {
    move |_: &Engine, _: &ConditionDefinition| {
        rec.constructions.fetch_add(1, Ordering::SeqCst);
        let condition = move |_: &Payload| -> Result<bool, EvaluationError> { Ok(answer) };
        Ok(Arc::new(condition) as Arc<dyn Condition>)
    }
}

struct PanickingAction;

impl Action for PanickingAction {
    #[allow(clippy::panic)]
    fn execute(&self, _payload: &Payload) -> Result<(), ExecutionError> {
        panic!("test.panic executed")
    }
}
