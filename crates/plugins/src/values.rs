// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading keys and values from payloads, arguments and the registry

use composer_core::payload::REGISTRY_KEY;
use composer_core::workflow::args;
use composer_core::{AnyValue, Args, Engine, Payload, WeakEngine};
use serde_json::Value;

/// Registry key: the payload's `registry.key`, else the `key` argument
pub(crate) fn key(payload: &Payload, fallback: Option<&str>) -> Option<String> {
    payload
        .text(REGISTRY_KEY)
        .or_else(|| fallback.map(str::to_string))
        .filter(|key| !key.trim().is_empty())
}

pub(crate) fn key_arg(arguments: &Args) -> Option<String> {
    args::string(arguments, "key")
}

/// Engine to act on: the payload's owner, else the one the behavior was built for
pub(crate) fn engine(payload: &Payload, built_for: &WeakEngine) -> Option<Engine> {
    payload.engine().cloned().or_else(|| built_for.upgrade())
}

/// JSON view of an opaque value, for the common scalar types
pub(crate) fn as_json(value: &AnyValue) -> Option<Value> {
    if let Some(v) = value.downcast_ref::<Value>() {
        return Some(v.clone());
    }
    if let Some(s) = value.downcast_ref::<String>() {
        return Some(Value::from(s.as_str()));
    }
    if let Some(s) = value.downcast_ref::<&'static str>() {
        return Some(Value::from(*s));
    }
    if let Some(b) = value.downcast_ref::<bool>() {
        return Some(Value::from(*b));
    }
    if let Some(n) = value.downcast_ref::<i64>() {
        return Some(Value::from(*n));
    }
    if let Some(n) = value.downcast_ref::<i32>() {
        return Some(Value::from(*n));
    }
    if let Some(n) = value.downcast_ref::<u64>() {
        return Some(Value::from(*n));
    }
    if let Some(n) = value.downcast_ref::<f64>() {
        return Some(Value::from(*n));
    }
    None
}

/// JSON kind name used by the `type` argument
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Bring `expected` to the kind of `actual` when it was written as a string
pub(crate) fn coerce(expected: &Value, actual: &Value) -> Value {
    match (expected, actual) {
        (Value::String(s), Value::Number(_)) => serde_json::from_str::<Value>(s.trim())
            .ok()
            .filter(Value::is_number)
            .unwrap_or_else(|| expected.clone()),
        (Value::String(s), Value::Bool(_)) => s
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| expected.clone()),
        _ => expected.clone(),
    }
}

/// Numbers compare by value so `1` matches `1.0`
pub(crate) fn same(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => expected == actual,
    }
}
