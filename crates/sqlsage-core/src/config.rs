// Agent configuration
//
// AgentConfig bundles everything a run needs that is not per-question:
// prompts, model selection, and the two termination bounds.

use serde::{Deserialize, Serialize};

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a database assistant. Your job is to:
1. Understand natural language database requests
2. Use the provided tools to interact with the database
3. Return clear, natural language responses

Start by understanding what exists in the database before making changes. \
If a tool fails, analyze the error and retry with corrections.";

/// Configuration for the agent control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System prompt that defines the agent's behavior
    pub system_prompt: String,

    /// Model identifier (e.g., "gpt-4o-mini")
    pub model: String,

    /// Temperature for LLM sampling
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per response
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Maximum tolerated tool failures before forced termination
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,

    /// Hard upper bound on state-machine transitions per run
    #[serde(default = "default_step_ceiling")]
    pub step_ceiling: usize,
}

fn default_max_errors() -> u32 {
    3
}

fn default_step_ceiling() -> usize {
    12
}

impl AgentConfig {
    /// Create a configuration for the given model with default bounds
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: model.into(),
            temperature: Some(0.0),
            max_tokens: None,
            max_errors: default_max_errors(),
            step_ceiling: default_step_ceiling(),
        }
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the error bound
    pub fn with_max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Set the step ceiling
    pub fn with_step_ceiling(mut self, step_ceiling: usize) -> Self {
        self.step_ceiling = step_ceiling;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("gpt-4o-mini")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = AgentConfig::default();
        assert_eq!(config.max_errors, 3);
        assert_eq!(config.step_ceiling, 12);
        assert_eq!(config.temperature, Some(0.0));
    }

    #[test]
    fn test_builder_methods() {
        let config = AgentConfig::new("gpt-4o")
            .with_system_prompt("Custom prompt")
            .with_max_errors(5)
            .with_step_ceiling(20);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.system_prompt, "Custom prompt");
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.step_ceiling, 20);
    }
}
