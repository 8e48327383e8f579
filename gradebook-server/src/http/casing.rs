//! Response key casing.
//!
//! The core emits snake_case keys everywhere; the HTTP boundary converts
//! them to camelCase just before serialization. Values are untouched.
//! Only object keys change, at every nesting level.

use serde_json::Value;

/// Recursively convert all object keys from snake_case to camelCase.
pub fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key), camel_case_keys(value)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(camel_case_keys).collect())
        }
        other => other,
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
