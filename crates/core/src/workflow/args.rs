// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient readers for definition arguments
//!
//! Definitions written by hand tend to mix `"5000"` and `5000`; these
//! helpers accept either where the meaning is unambiguous.

use super::Args;
use crate::behavior::ConstructionError;
use serde_json::Value;
use std::time::Duration;

/// String argument; numbers and booleans are rendered as text
pub fn string(args: &Args, name: &str) -> Option<String> {
    args.get(name).and_then(value_string)
}

pub fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Required string argument
pub fn require_string(args: &Args, name: &str) -> Result<String, ConstructionError> {
    string(args, name).ok_or_else(|| ConstructionError::MissingArgument(name.to_string()))
}

/// Integer argument from a number or numeric string
pub fn integer(args: &Args, name: &str) -> Option<i64> {
    match args.get(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn boolean(args: &Args, name: &str) -> Option<bool> {
    match args.get(name)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Duration argument: a number of milliseconds or a humantime string
///
/// Absent arguments are `Ok(None)`. Zero and negative durations are
/// rejected.
pub fn duration(args: &Args, name: &str) -> Result<Option<Duration>, ConstructionError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_duration(value)
            .map(Some)
            .map_err(|reason| ConstructionError::InvalidArgument {
                name: name.to_string(),
                reason,
            }),
    }
}

/// Interpret a JSON value as a positive duration
pub fn value_duration(value: &Value) -> Result<Duration, String> {
    let duration = match value {
        Value::Number(n) => match n.as_u64() {
            Some(ms) => Duration::from_millis(ms),
            None => return Err(format!("{n} is not a non-negative whole number of milliseconds")),
        },
        Value::String(s) => parse_duration(s)?,
        other => return Err(format!("expected milliseconds or a duration string, got {other}")),
    };
    if duration.is_zero() {
        return Err("duration must be positive".to_string());
    }
    Ok(duration)
}

/// Parse `"1500"` as milliseconds, otherwise as a humantime string like `"5s"`
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
