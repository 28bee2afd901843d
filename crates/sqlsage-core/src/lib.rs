// Agent Control Loop Abstractions
//
// This crate provides a DB-agnostic implementation of the agent control
// loop: a Plan -> Execute -> Reflect -> Finish state machine that interleaves
// LLM calls with tool execution, bounds retries, and always terminates with
// a natural-language answer.
//
// Key design decisions:
// - Traits at the seams (Tool, LlmDriver, InteractionLogger,
//   CompletionClassifier) keep the loop independent of any backend
// - Every tool returns the same ToolResult envelope, so the loop has one
//   failure path; no fault crosses the Execute boundary uncaught
// - Two independent termination bounds: error counter and step ceiling
// - The scripted driver makes loop behavior testable without a provider

pub mod agent;
pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod message;
pub mod scripted;
pub mod tool_types;
pub mod tools;

// Re-exports for convenience
pub use agent::{Agent, Phase, RunState, ToolOutcome};
pub use classifier::{CompletionClassifier, DoneMarkerClassifier};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use llm::{
    BoxedLlmDriver, LlmCallConfig, LlmCompletionMetadata, LlmDriver, LlmMessage, LlmMessageRole,
    LlmResponse,
};
pub use logger::{FileInteractionLogger, InteractionLogger, NoopInteractionLogger, RunLogId};
pub use message::{Message, MessageRole};
pub use scripted::ScriptedLlmDriver;
pub use tool_types::{ToolCall, ToolDefinition, ToolErrorKind, ToolResult};
pub use tools::{EchoTool, FailingTool, Tool, ToolRegistry, ToolRegistryBuilder};
