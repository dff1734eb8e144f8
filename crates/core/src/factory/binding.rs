// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binding factory

use crate::behavior::ConstructionError;
use crate::workflow::BindingDefinition;

/// Produces the binding the interpreter subscribes for a definition
///
/// The interpreter records the subscriber id in the returned binding's slot.
/// A plain `clone()` shares the definition's slot, so the id is visible
/// through the loaded workflow too.
pub trait BindingFactory: Send + Sync {
    fn create(
        &self,
        definition: &BindingDefinition,
    ) -> Result<BindingDefinition, ConstructionError>;
}

/// Uses each definition as-is
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBindingFactory;

impl BindingFactory for DefaultBindingFactory {
    fn create(
        &self,
        definition: &BindingDefinition,
    ) -> Result<BindingDefinition, ConstructionError> {
        tracing::trace!(binding = %definition.id, "providing binding");
        Ok(definition.clone())
    }
}
