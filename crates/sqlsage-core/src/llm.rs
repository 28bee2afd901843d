// LLM Driver Abstractions
//
// Provider-agnostic types for LLM interactions. Implementations handle
// provider-specific API calls and response parsing; the control loop only
// sees messages in, one response out.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{Message, MessageRole};
use crate::tool_types::{ToolCall, ToolDefinition};

// ============================================================================
// LlmDriver Trait
// ============================================================================

/// Trait for LLM drivers
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Send a conversation plus the tool catalog and return one response
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse>;
}

/// Boxed LLM driver for dynamic dispatch
pub type BoxedLlmDriver = Box<dyn LlmDriver>;

#[async_trait]
impl LlmDriver for Box<dyn LlmDriver> {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        (**self).chat_completion(messages, config).await
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Message role for LLM calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmMessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Message format for LLM calls (provider-agnostic)
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: LlmMessageRole,
    pub content: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_id: Option<String>,
}

impl LlmMessage {
    /// Create a message with text content
    pub fn text(role: LlmMessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

impl From<&Message> for LlmMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => LlmMessageRole::System,
            MessageRole::User => LlmMessageRole::User,
            MessageRole::Assistant => LlmMessageRole::Assistant,
            MessageRole::Tool => LlmMessageRole::Tool,
        };

        LlmMessage {
            role,
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.clone(),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

// ============================================================================
// Configuration and Response Types
// ============================================================================

/// Configuration for an LLM call
#[derive(Debug, Clone)]
pub struct LlmCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<ToolDefinition>,
}

/// Metadata about LLM completion
#[derive(Debug, Clone, Default)]
pub struct LlmCompletionMetadata {
    /// Total tokens used
    pub total_tokens: Option<u32>,
    /// Prompt tokens
    pub prompt_tokens: Option<u32>,
    /// Completion tokens
    pub completion_tokens: Option<u32>,
    /// Model used
    pub model: Option<String>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response from an LLM call
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub metadata: LlmCompletionMetadata,
}

impl LlmResponse {
    /// Create a plain text response (no tool calls, no metadata)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            tool_calls: None,
            metadata: LlmCompletionMetadata::default(),
        }
    }

    /// Create a response carrying tool call requests
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: content.into(),
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            metadata: LlmCompletionMetadata::default(),
        }
    }

    /// Convert this response into a conversation message
    pub fn into_message(self) -> Message {
        Message::assistant_with_tools(self.text, self.tool_calls.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_conversion_keeps_tool_calls() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "read_records".to_string(),
            arguments: json!({"table_name": "users"}),
        };
        let msg = Message::assistant_with_tools("checking", vec![call]);
        let llm_msg = LlmMessage::from(&msg);

        assert_eq!(llm_msg.role, LlmMessageRole::Assistant);
        assert_eq!(llm_msg.content, "checking");
        assert_eq!(llm_msg.tool_calls.unwrap()[0].name, "read_records");
    }

    #[test]
    fn test_response_into_message() {
        let response = LlmResponse::with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "describe_database".to_string(),
                arguments: json!({}),
            }],
        );
        let msg = response.into_message();
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_empty_tool_calls_normalized_to_none() {
        let response = LlmResponse::with_tool_calls("done", vec![]);
        assert!(response.tool_calls.is_none());
    }
}
