// OpenAI LLM Driver
//
// Non-streaming chat completions against the OpenAI API (or any
// OpenAI-compatible endpoint via `with_base_url`).

use async_trait::async_trait;

use sqlsage_core::{AgentError, LlmCallConfig, LlmDriver, LlmMessage, LlmResponse, Result};

use crate::types::{ApiErrorBody, ChatRequest, ChatResponse};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI chat completions driver
///
/// # Example
///
/// ```ignore
/// use sqlsage_openai::OpenAiDriver;
///
/// let driver = OpenAiDriver::from_env()?;
/// // or
/// let driver = OpenAiDriver::new("your-api-key");
/// // or against a compatible endpoint
/// let driver = OpenAiDriver::with_base_url("key", "https://api.example.com/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct OpenAiDriver {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl OpenAiDriver {
    /// Create a new driver with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create a new driver from the OPENAI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::config("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    /// Create a new driver with a custom API URL
    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// Get the API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl LlmDriver for OpenAiDriver {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        let request = ChatRequest::build(&messages, config);

        tracing::debug!(
            model = %config.model,
            messages = messages.len(),
            tools = config.tools.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(AgentError::llm(format!(
                "API returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::llm(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.into_llm_response())
    }
}

impl std::fmt::Debug for OpenAiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiDriver")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let driver = OpenAiDriver::new("sk-secret");
        let debug = format!("{:?}", driver);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_custom_base_url() {
        let driver = OpenAiDriver::with_base_url("key", "https://example.com/v1/chat");
        assert_eq!(driver.api_url(), "https://example.com/v1/chat");
    }
}
