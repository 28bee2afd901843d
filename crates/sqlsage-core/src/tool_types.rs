// Tool runtime types
//
// Design Decision: Tools are identified by name (string) for extensibility.
// Every tool returns the same ToolResult envelope, so the control loop has
// exactly one failure-handling path regardless of which tool ran.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition handed to the LLM driver as part of the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (used by the LLM and for registry lookup)
    pub name: String,
    /// Tool description for the LLM
    pub description: String,
    /// JSON schema for tool parameters
    pub parameters: Value,
}

/// Tool call requested by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call, scoped to the run
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// Arguments as JSON
    pub arguments: Value,
}

/// Classification of tool failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Requested tool name is not registered
    UnknownTool,
    /// Required arguments missing or invalid
    MalformedArguments,
    /// The database backend raised
    BackendFailure,
    /// DDL sub-operation outside the supported set
    UnsupportedOperation,
    /// Transaction mode outside the supported set
    InvalidMode,
    /// Delete requested with no filter conditions
    UnsafeDelete,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolErrorKind::UnknownTool => write!(f, "unknown_tool"),
            ToolErrorKind::MalformedArguments => write!(f, "malformed_arguments"),
            ToolErrorKind::BackendFailure => write!(f, "backend_failure"),
            ToolErrorKind::UnsupportedOperation => write!(f, "unsupported_operation"),
            ToolErrorKind::InvalidMode => write!(f, "invalid_mode"),
            ToolErrorKind::UnsafeDelete => write!(f, "unsafe_delete"),
        }
    }
}

/// Uniform result envelope returned by every tool.
///
/// Invariants (enforced by the constructors):
/// - `success == false` implies `payload` is absent and `error` is non-empty
/// - `success == true` implies `error` and `kind` are absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
    /// Result payload (rows, counts, metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Error text (failures only; backend diagnostics preserved verbatim)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolErrorKind>,
}

impl ToolResult {
    /// Create a successful result with a payload
    pub fn ok(message: impl Into<String>, payload: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Some(payload),
            error: None,
            kind: None,
        }
    }

    /// Create a successful result without a payload
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
            error: None,
            kind: None,
        }
    }

    /// Create a failed result
    pub fn fail(kind: ToolErrorKind, message: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: message.into(),
            payload: None,
            error: Some(if error.is_empty() {
                kind.to_string()
            } else {
                error
            }),
            kind: Some(kind),
        }
    }

    /// Check if this result has the given failure kind
    pub fn is_failure_kind(&self, kind: ToolErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Serialize the envelope for folding into a tool-role message
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"success": false}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_result_has_no_error() {
        let result = ToolResult::ok("done", json!({"count": 1}));
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(result.kind.is_none());
        assert_eq!(result.payload.unwrap()["count"], 1);
    }

    #[test]
    fn test_fail_result_has_no_payload() {
        let result = ToolResult::fail(
            ToolErrorKind::BackendFailure,
            "Failed to query users",
            "relation \"users\" does not exist",
        );
        assert!(!result.success);
        assert!(result.payload.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("relation \"users\" does not exist")
        );
        assert!(result.is_failure_kind(ToolErrorKind::BackendFailure));
    }

    #[test]
    fn test_fail_result_never_empty_error() {
        let result = ToolResult::fail(ToolErrorKind::UnknownTool, "no such tool", "");
        assert_eq!(result.error.as_deref(), Some("unknown_tool"));
    }

    #[test]
    fn test_envelope_serialization_skips_absent_fields() {
        let value = ToolResult::ok_empty("done").to_json();
        assert!(value.get("payload").is_none());
        assert!(value.get("error").is_none());
        assert_eq!(value["success"], true);
    }
}
