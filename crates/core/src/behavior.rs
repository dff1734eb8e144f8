// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executable behavior contracts
//!
//! A `Condition` answers whether a payload should proceed; an `Action` does
//! work for it. Both are produced from declarative definitions by the
//! resolution caches and shared by every evaluation of an equal definition,
//! so implementations must be safe to call concurrently.

use crate::payload::Payload;
use thiserror::Error;

/// Gate evaluated against a payload
pub trait Condition: Send + Sync {
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError>;
}

/// Work performed for a payload
pub trait Action: Send + Sync {
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError>;
}

impl<F> Condition for F
where
    F: Fn(&Payload) -> Result<bool, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, payload: &Payload) -> Result<bool, EvaluationError> {
        self(payload)
    }
}

impl<F> Action for F
where
    F: Fn(&Payload) -> Result<(), ExecutionError> + Send + Sync,
{
    fn execute(&self, payload: &Payload) -> Result<(), ExecutionError> {
        self(payload)
    }
}

/// A condition raised instead of answering
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("payload is not attached to an engine")]
    Detached,
    #[error("{0}")]
    Failed(String),
}

/// An action raised while running
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("payload is not attached to an engine")]
    Detached,
    #[error("{0}")]
    Failed(String),
}

/// A factory could not build a behavior from its definition
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("{0}")]
    Failed(String),
}

impl EvaluationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl ExecutionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
