//! Defensive access to untyped values and the parser fault boundary

use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};

static NULL: Value = Value::Null;

/// Walk `keys` into a nested value.
///
/// Object keys are matched by name, array elements by decimal index. Any
/// mismatch along the way yields `Value::Null` instead of an error.
pub fn lookup_path<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    let mut current = value;
    for key in keys {
        current = match current {
            Value::Object(map) => match map.get(*key) {
                Some(next) => next,
                None => return &NULL,
            },
            Value::Array(items) => match key.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(next) => next,
                None => return &NULL,
            },
            _ => return &NULL,
        };
    }
    current
}

/// String at `keys`, or empty
pub fn lookup_str<'a>(value: &'a Value, keys: &[&str]) -> &'a str {
    lookup_path(value, keys).as_str().unwrap_or_default()
}

/// Run a parser, turning a panic into `Err` with the panic message
pub fn guard<T>(parser: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(parser)).map_err(|payload| {
        if let Some(msg) = payload.downcast_ref::<&str>() {
            format!("parser fault: {}", msg)
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            format!("parser fault: {}", msg)
        } else {
            "parser fault".to_string()
        }
    })
}
