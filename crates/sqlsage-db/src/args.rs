// Argument extraction helpers shared by the tool implementations.
//
// Each helper returns a ready-made failure envelope on the Err side so the
// tools can use `?`-free early returns via match and stay envelope-only.

use serde_json::{Map, Value};
use sqlsage_core::{ToolErrorKind, ToolResult};

pub(crate) fn require_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolResult> {
    match arguments.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            format!("Invalid arguments: '{}' must be a non-empty string", key),
            format!("Missing or invalid argument: {}", key),
        )),
    }
}

pub(crate) fn require_object(
    arguments: &Value,
    key: &str,
) -> Result<Map<String, Value>, ToolResult> {
    match arguments.get(key).and_then(|v| v.as_object()) {
        Some(map) => Ok(map.clone()),
        None => Err(ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            format!("Invalid arguments: '{}' must be an object", key),
            format!("Missing or invalid argument: {}", key),
        )),
    }
}

/// Absent key reads as an empty object; present-but-not-an-object is a
/// malformed argument, not an empty one.
pub(crate) fn optional_object(
    arguments: &Value,
    key: &str,
) -> Result<Map<String, Value>, ToolResult> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            format!("Invalid arguments: '{}' must be an object", key),
            format!("Invalid argument: {}", key),
        )),
    }
}

pub(crate) fn optional_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(|v| v.as_str())
}

pub(crate) fn optional_i64(arguments: &Value, key: &str) -> Option<i64> {
    arguments.get(key).and_then(|v| v.as_i64())
}

pub(crate) fn optional_string_array(
    arguments: &Value,
    key: &str,
) -> Result<Option<Vec<String>>, ToolResult> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut strings = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) => strings.push(s.to_string()),
                    None => {
                        return Err(ToolResult::fail(
                            ToolErrorKind::MalformedArguments,
                            format!("Invalid arguments: '{}' must be an array of strings", key),
                            format!("Invalid argument: {}", key),
                        ))
                    }
                }
            }
            Ok(Some(strings))
        }
        Some(_) => Err(ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            format!("Invalid arguments: '{}' must be an array of strings", key),
            format!("Invalid argument: {}", key),
        )),
    }
}

pub(crate) fn require_string_array(arguments: &Value, key: &str) -> Result<Vec<String>, ToolResult> {
    match optional_string_array(arguments, key)? {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            format!("Invalid arguments: '{}' must be a non-empty array of strings", key),
            format!("Missing or invalid argument: {}", key),
        )),
    }
}

/// Map a backend error into the uniform envelope, preserving the driver's
/// diagnostic text for the Reflect phase.
pub(crate) fn backend_failure(action: &str, err: anyhow::Error) -> ToolResult {
    ToolResult::fail(
        ToolErrorKind::BackendFailure,
        format!("Failed to {}", action),
        format!("{:#}", err),
    )
}
