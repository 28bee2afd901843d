// Error types for the agent control loop
//
// Deliberately small: tool failures never surface here (they stay inside
// the ToolResult envelope), and bound exhaustion forces Finish rather than
// erroring, so only driver and configuration failures remain.

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while running the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM driver error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        AgentError::Llm(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AgentError::llm("connection refused").to_string(),
            "LLM error: connection refused"
        );
        assert_eq!(
            AgentError::config("OPENAI_API_KEY environment variable not set").to_string(),
            "Configuration error: OPENAI_API_KEY environment variable not set"
        );
    }
}
