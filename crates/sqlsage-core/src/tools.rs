// Tool Abstraction for the Control Loop
//
// Tools are defined using the `Tool` trait and registered with a
// `ToolRegistry`, which the Execute phase drives.
//
// Design decisions:
// - Tools are defined via a trait for flexibility (function-style tools)
// - `invoke` never raises past the registry boundary: unknown names and
//   malformed arguments are folded into the ToolResult envelope so the
//   loop's Reflect phase can reason about them
// - Argument validation re-checks the declared schema's required keys
//   before dispatch; the tool never runs with missing data

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::tool_types::{ToolCall, ToolDefinition, ToolErrorKind, ToolResult};

// ============================================================================
// Tool Trait
// ============================================================================

/// Trait for implementing tools invocable by the LLM's request.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's unique name.
    ///
    /// This name is used by the LLM to invoke the tool and must be unique
    /// within a ToolRegistry.
    fn name(&self) -> &str;

    /// Returns a description of what the tool does, provided to the LLM.
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// Implementations must catch their own faults and map them into the
    /// envelope; returning is the only way out of a tool.
    async fn execute(&self, arguments: Value) -> ToolResult;

    /// Convert this tool to a ToolDefinition for the LLM catalog.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

// ============================================================================
// ToolRegistry
// ============================================================================

/// A registry mapping tool names to implementations.
///
/// Shared across runs; read-mostly after construction.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool with the registry.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Register an Arc-wrapped tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool definitions for the LLM catalog
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool by name.
    ///
    /// Never faults: unknown names and missing required arguments come back
    /// as failed envelopes, not errors.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::fail(
                ToolErrorKind::UnknownTool,
                format!("Tool '{}' is not available", name),
                format!("Tool not found: {}", name),
            );
        };

        if let Some(missing) = missing_required_keys(&tool.parameters_schema(), &arguments) {
            return ToolResult::fail(
                ToolErrorKind::MalformedArguments,
                format!("Invalid arguments for tool '{}'", name),
                format!("Missing required arguments: {}", missing.join(", ")),
            );
        }

        tool.execute(arguments).await
    }

    /// Invoke the tool named by a ToolCall
    pub async fn invoke_call(&self, call: &ToolCall) -> ToolResult {
        self.invoke(&call.name, call.arguments.clone()).await
    }

    /// Create a builder for fluent tool registration
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// Required keys declared by the schema that are absent from the arguments.
///
/// Returns None when all required keys are present. Non-object arguments
/// count as missing everything the schema requires.
fn missing_required_keys(schema: &Value, arguments: &Value) -> Option<Vec<String>> {
    let required = schema.get("required")?.as_array()?;
    if required.is_empty() {
        return None;
    }

    let missing: Vec<String> = required
        .iter()
        .filter_map(|k| k.as_str())
        .filter(|key| {
            arguments
                .as_object()
                .map_or(true, |obj| !obj.contains_key(*key))
        })
        .map(|k| k.to_string())
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(missing)
    }
}

// ============================================================================
// ToolRegistryBuilder
// ============================================================================

/// Builder for creating a ToolRegistry with a fluent API.
pub struct ToolRegistryBuilder {
    registry: ToolRegistry,
}

impl ToolRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    /// Add a tool to the registry
    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.registry.register(tool);
        self
    }

    /// Add an Arc-wrapped tool to the registry
    pub fn tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register_arc(tool);
        self
    }

    /// Build the registry
    pub fn build(self) -> ToolRegistry {
        self.registry
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Built-in Tools (testing)
// ============================================================================

/// A tool that echoes back its arguments (useful for testing)
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo back the provided message. Useful for testing tool execution."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo back"
                }
            },
            "required": ["message"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let message = arguments
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        ToolResult::ok(
            "Echoed message",
            serde_json::json!({
                "echoed": message,
                "length": message.len()
            }),
        )
    }
}

/// A tool that always fails (useful for testing error handling)
pub struct FailingTool {
    kind: ToolErrorKind,
    error_message: String,
}

impl FailingTool {
    /// Create a failing tool with the given failure kind and error text
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            error_message: message.into(),
        }
    }
}

impl Default for FailingTool {
    fn default() -> Self {
        Self::new(ToolErrorKind::BackendFailure, "Tool execution failed")
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing_tool"
    }

    fn description(&self) -> &str {
        "A tool that always fails (for testing error handling)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _arguments: Value) -> ToolResult {
        ToolResult::fail(self.kind, "Tool failed", self.error_message.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
