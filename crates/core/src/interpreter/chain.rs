// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition and action chains shared by bound workflows and initializers

use crate::behavior::{Action, Condition};
use crate::engine::Engine;
use crate::payload::Payload;
use crate::unwind;
use crate::workflow::{ActionDefinition, ConditionDefinition};
use std::sync::Arc;

/// Short-circuit AND over the conditions that resolve
///
/// Definitions that cannot be resolved are left out of the chain. The first
/// condition that answers false, fails, or panics closes the gate.
pub(crate) fn gate(
    engine: &Engine,
    owner: &str,
    definitions: &[ConditionDefinition],
    payload: &Payload,
) -> bool {
    let conditions: Vec<(&str, Arc<dyn Condition>)> = definitions
        .iter()
        .filter_map(|def| {
            engine
                .interpreter()
                .condition(def)
                .map(|c| (def.type_id.as_str(), c))
        })
        .collect();

    for (type_id, condition) in conditions {
        match unwind::contain(|| condition.evaluate(payload)) {
            Ok(Ok(true)) => {
                tracing::trace!(owner, condition = type_id, "condition passed");
            }
            Ok(Ok(false)) => {
                tracing::debug!(
                    owner,
                    condition = type_id,
                    "condition not met, skipping actions"
                );
                return false;
            }
            Ok(Err(e)) => {
                tracing::error!(owner, condition = type_id, error = %e, "condition failed");
                return false;
            }
            Err(panic) => {
                tracing::error!(owner, condition = type_id, panic = %panic, "condition panicked");
                return false;
            }
        }
    }
    true
}

/// Execute every action that resolves, in order; failures do not stop the chain
pub(crate) fn run(
    engine: &Engine,
    owner: &str,
    definitions: &[ActionDefinition],
    payload: &Payload,
) {
    let actions: Vec<(&str, Arc<dyn Action>)> = definitions
        .iter()
        .filter_map(|def| {
            engine
                .interpreter()
                .action(def)
                .map(|a| (def.type_id.as_str(), a))
        })
        .collect();

    for (type_id, action) in actions {
        tracing::debug!(owner, action = type_id, "executing action");
        match unwind::contain(|| action.execute(payload)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(owner, action = type_id, error = %e, "action failed");
            }
            Err(panic) => {
                tracing::error!(owner, action = type_id, panic = %panic, "action panicked");
            }
        }
    }
}
