// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Built-in conditions and actions for the Composer engine
//!
//! Every behavior here treats a cancelled payload as "do nothing": conditions
//! answer false and actions return without touching state.

mod actions;
mod conditions;
mod values;

pub use actions::{CancelPayload, RegistryClear, RegistryPopulate, RegistryRemove, RegistrySet};
pub use conditions::{All, Any, Not, RegistryContains, RegistryMissing};

use composer_core::{Action, Condition, PluginResolver};
use std::sync::Arc;

pub const ALL: &str = "all";
pub const ANY: &str = "any";
pub const NOT: &str = "not";
pub const REGISTRY_CONTAINS: &str = "registry.contains";
pub const REGISTRY_MISSING: &str = "registry.missing";
pub const REGISTRY_SET: &str = "registry.set";
pub const REGISTRY_REMOVE: &str = "registry.remove";
pub const REGISTRY_CLEAR: &str = "registry.clear";
pub const REGISTRY_POPULATE: &str = "registry.populate";
pub const PAYLOAD_CANCEL: &str = "payload.cancel";

/// Register the built-in catalog
pub fn install(resolver: &mut PluginResolver) {
    resolver
        .register_condition(ALL, |engine, def| {
            Ok(Arc::new(All::new(engine, def)) as Arc<dyn Condition>)
        })
        .register_condition(ANY, |engine, def| {
            Ok(Arc::new(Any::new(engine, def)) as Arc<dyn Condition>)
        })
        .register_condition(NOT, |engine, def| {
            Ok(Arc::new(Not::new(engine, def)?) as Arc<dyn Condition>)
        })
        .register_condition(REGISTRY_CONTAINS, |engine, def| {
            Ok(Arc::new(RegistryContains::new(engine, &def.args)) as Arc<dyn Condition>)
        })
        .register_condition(REGISTRY_MISSING, |engine, def| {
            Ok(Arc::new(RegistryMissing::new(engine, &def.args)) as Arc<dyn Condition>)
        })
        .register_action(REGISTRY_SET, |engine, def| {
            Ok(Arc::new(RegistrySet::new(engine, &def.args)) as Arc<dyn Action>)
        })
        .register_action(REGISTRY_REMOVE, |engine, def| {
            Ok(Arc::new(RegistryRemove::new(engine, &def.args)) as Arc<dyn Action>)
        })
        .register_action(REGISTRY_CLEAR, |engine, _| {
            Ok(Arc::new(RegistryClear::new(engine)) as Arc<dyn Action>)
        })
        .register_action(REGISTRY_POPULATE, |engine, def| {
            Ok(Arc::new(RegistryPopulate::new(engine, &def.args)?) as Arc<dyn Action>)
        })
        .register_action(PAYLOAD_CANCEL, |_, _| {
            Ok(Arc::new(CancelPayload) as Arc<dyn Action>)
        });
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
