// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}

#[parameterized(
    millis_number = { json!(1500), Duration::from_millis(1500) },
    millis_string = { json!("250"), Duration::from_millis(250) },
    humantime_seconds = { json!("5s"), Duration::from_secs(5) },
    humantime_compound = { json!("1m 30s"), Duration::from_secs(90) },
)]
fn durations_accept_millis_and_humantime(raw: Value, expected: Duration) {
    let args = args(json!({ "ttl": raw }));
    assert_eq!(duration(&args, "ttl").unwrap(), Some(expected));
}

#[parameterized(
    zero = { json!(0) },
    negative = { json!(-5) },
    garbage = { json!("soon") },
    wrong_shape = { json!([1, 2]) },
)]
fn invalid_durations_are_rejected(raw: Value) {
    let args = args(json!({ "ttl": raw }));
    assert!(matches!(
        duration(&args, "ttl"),
        Err(ConstructionError::InvalidArgument { .. })
    ));
}

#[test]
fn absent_duration_is_none() {
    let args = args(json!({ "ttl": null }));
    assert_eq!(duration(&args, "ttl").unwrap(), None);
    assert_eq!(duration(&args, "other").unwrap(), None);
}

#[test]
fn scalars_read_leniently() {
    let args = args(json!({ "n": "42", "m": 7, "flag": "true", "name": 3 }));

    assert_eq!(integer(&args, "n"), Some(42));
    assert_eq!(integer(&args, "m"), Some(7));
    assert_eq!(boolean(&args, "flag"), Some(true));
    assert_eq!(string(&args, "name").as_deref(), Some("3"));
    assert!(matches!(
        require_string(&args, "missing"),
        Err(ConstructionError::MissingArgument(name)) if name == "missing"
    ));
}
