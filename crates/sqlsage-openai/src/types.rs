// OpenAI Protocol Types
//
// Wire format for the chat completions endpoint, plus conversions to and
// from the provider-agnostic driver types. Tool call arguments travel as a
// JSON-encoded string on the wire and are parsed back into values here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sqlsage_core::{
    LlmCallConfig, LlmCompletionMetadata, LlmMessage, LlmMessageRole, LlmResponse, ToolCall,
};

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiTool>>,
}

impl ChatRequest {
    /// Assemble a request from driver-level messages and call config
    pub fn build(messages: &[LlmMessage], config: &LlmCallConfig) -> Self {
        let tools: Vec<OpenAiTool> = config
            .tools
            .iter()
            .map(|tool| OpenAiTool {
                r#type: "function".to_string(),
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect();

        Self {
            model: config.model.clone(),
            messages: messages.iter().map(to_openai_message).collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            tools: if tools.is_empty() { None } else { Some(tools) },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiTool {
    pub r#type: String,
    pub function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    pub r#type: String,
    pub function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, per the wire format
    pub arguments: String,
}

// Response types

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub choices: Vec<OpenAiChoice>,
    pub usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Error body the API returns on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_openai_message(msg: &LlmMessage) -> OpenAiMessage {
    let role = match msg.role {
        LlmMessageRole::System => "system",
        LlmMessageRole::User => "user",
        LlmMessageRole::Assistant => "assistant",
        LlmMessageRole::Tool => "tool",
    };

    OpenAiMessage {
        role: role.to_string(),
        content: Some(msg.content.clone()),
        tool_calls: msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| OpenAiToolCall {
                    id: tc.id.clone(),
                    r#type: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: tc.name.clone(),
                        arguments: serde_json::to_string(&tc.arguments).unwrap_or_default(),
                    },
                })
                .collect()
        }),
        tool_call_id: msg.tool_call_id.clone(),
    }
}

impl ChatResponse {
    /// Convert the first choice into a driver response.
    ///
    /// Tool call arguments that fail to parse come through as null rather
    /// than dropping the call; the registry reports the missing keys.
    pub fn into_llm_response(self) -> LlmResponse {
        let metadata = LlmCompletionMetadata {
            total_tokens: self.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: self.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: self.usage.as_ref().map(|u| u.completion_tokens),
            model: Some(self.model),
            finish_reason: self.choices.first().and_then(|c| c.finish_reason.clone()),
        };

        let Some(choice) = self.choices.into_iter().next() else {
            return LlmResponse {
                text: String::new(),
                tool_calls: None,
                metadata,
            };
        };

        let tool_calls = choice.message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: serde_json::from_str(&tc.function.arguments)
                        .unwrap_or(Value::Null),
                })
                .collect::<Vec<_>>()
        });

        LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_calls: tool_calls.filter(|c| !c.is_empty()),
            metadata,
        }
    }
}
