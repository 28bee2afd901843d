// Integration tests for the agent control loop
//
// These drive the full Plan/Execute/Reflect/Finish machine with a scripted
// LLM driver and in-memory tools, covering both termination bounds, the
// completion signal, the single-call-per-cycle policy, and the end-to-end
// scenarios.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sqlsage_core::{
    Agent, AgentConfig, EchoTool, FailingTool, LlmResponse, ScriptedLlmDriver, Tool, ToolCall,
    ToolErrorKind, ToolRegistry, ToolResult,
};

fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

/// Tool returning a fixed table listing, counting its invocations
struct ListTablesTool {
    invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        "describe_database"
    }

    fn description(&self) -> &str {
        "List all tables in the database"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> ToolResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        ToolResult::ok(
            "Successfully retrieved database schema",
            json!({
                "tables": [
                    {"table_name": "orders", "table_type": "BASE TABLE"},
                    {"table_name": "users", "table_type": "BASE TABLE"}
                ],
                "table_count": 2
            }),
        )
    }
}

// ============================================================================
// Scenario: "What tables exist?"
// ============================================================================

#[tokio::test]
async fn test_describe_database_scenario() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let registry = ToolRegistry::builder()
        .tool(ListTablesTool {
            invocations: invocations.clone(),
        })
        .build();

    let driver = ScriptedLlmDriver::new(vec![
        // Plan: request the tool
        LlmResponse::with_tool_calls("", vec![call("call_1", "describe_database", json!({}))]),
        // Reflect: signal completion
        LlmResponse::text("DONE. The database has the tables orders and users."),
        // Finish: summary
        LlmResponse::text("The database contains two tables: orders and users."),
    ]);

    let agent = Agent::new(driver, registry, AgentConfig::default());
    let answer = agent.process("What tables exist?").await;

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(
        answer,
        "The database contains two tables: orders and users."
    );
}

// ============================================================================
// Scenario: unknown tool, recovery, then success
// ============================================================================

#[tokio::test]
async fn test_unknown_tool_then_recovery() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let registry = ToolRegistry::builder()
        .tool(ListTablesTool {
            invocations: invocations.clone(),
        })
        .build();

    let driver = ScriptedLlmDriver::new(vec![
        // Plan: request a tool that does not exist
        LlmResponse::with_tool_calls("", vec![call("call_1", "list_everything", json!({}))]),
        // Reflect (recovery): retry with the real tool
        LlmResponse::with_tool_calls(
            "Retrying with describe_database",
            vec![call("call_2", "describe_database", json!({}))],
        ),
        // Plan: the retry request
        LlmResponse::with_tool_calls("", vec![call("call_3", "describe_database", json!({}))]),
        // Reflect: done
        LlmResponse::text("DONE."),
        // Finish
        LlmResponse::text("Recovered and listed the tables."),
    ]);

    let agent = Agent::new(driver, registry, AgentConfig::default());
    let answer = agent.process("What tables exist?").await;

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(answer, "Recovered and listed the tables.");
}

// ============================================================================
// Error bound
// ============================================================================

#[tokio::test]
async fn test_error_bound_forces_finish() {
    let registry = ToolRegistry::builder()
        .tool(FailingTool::new(ToolErrorKind::BackendFailure, "boom"))
        .build();

    // The model keeps retrying the failing tool forever
    let retry = LlmResponse::with_tool_calls(
        "Retrying",
        vec![call("call_r", "failing_tool", json!({}))],
    );
    let driver = ScriptedLlmDriver::new(vec![]).with_fallback(retry);

    let config = AgentConfig::default().with_max_errors(3).with_step_ceiling(50);
    let agent = Agent::new(driver, registry, config);
    let answer = agent.process("Break things").await;

    // The fallback text is also the summary, so the run still answers
    assert!(!answer.is_empty());
    assert!(!answer.starts_with("I encountered an error"));
}

#[tokio::test]
async fn test_no_errors_no_counter_increment() {
    let registry = ToolRegistry::builder().tool(EchoTool).build();

    let driver = ScriptedLlmDriver::new(vec![
        LlmResponse::with_tool_calls("", vec![call("c1", "echo", json!({"message": "hi"}))]),
        LlmResponse::text("DONE."),
        LlmResponse::text("Echoed successfully."),
    ]);

    // max_errors = 1: a single failure would end the run before Finish's
    // scripted summary; success must not count against the bound
    let config = AgentConfig::default().with_max_errors(1);
    let agent = Agent::new(driver, registry, config);
    let answer = agent.process("Echo hi").await;

    assert_eq!(answer, "Echoed successfully.");
}

// ============================================================================
// Step ceiling
// ============================================================================

#[tokio::test]
async fn test_step_ceiling_terminates_run() {
    let registry = ToolRegistry::builder().tool(EchoTool).build();

    // Model never signals completion, never errors: every Plan requests a
    // successful echo and every Reflect requests another
    let keep_going = LlmResponse::with_tool_calls(
        "More to do",
        vec![call("call_x", "echo", json!({"message": "again"}))],
    );
    let driver = ScriptedLlmDriver::new(vec![]).with_fallback(keep_going);

    let config = AgentConfig::default().with_step_ceiling(9).with_max_errors(100);
    let agent = Agent::new(driver, registry, config);
    let answer = agent.process("Loop forever").await;

    // Terminates and still answers (the fallback doubles as the summary)
    assert!(!answer.is_empty());
}

#[tokio::test]
async fn test_step_ceiling_bounds_driver_calls() {
    let registry = ToolRegistry::builder().tool(EchoTool).build();

    let keep_going = LlmResponse::with_tool_calls(
        "More to do",
        vec![call("call_x", "echo", json!({"message": "again"}))],
    );
    let driver = Arc::new(ScriptedLlmDriver::new(vec![]).with_fallback(keep_going));

    struct SharedDriver(Arc<ScriptedLlmDriver>);

    #[async_trait]
    impl sqlsage_core::LlmDriver for SharedDriver {
        async fn chat_completion(
            &self,
            messages: Vec<sqlsage_core::LlmMessage>,
            config: &sqlsage_core::LlmCallConfig,
        ) -> sqlsage_core::Result<LlmResponse> {
            self.0.chat_completion(messages, config).await
        }
    }

    let ceiling = 9;
    let config = AgentConfig::default()
        .with_step_ceiling(ceiling)
        .with_max_errors(100);
    let agent = Agent::new(SharedDriver(driver.clone()), registry, config);
    agent.process("Loop forever").await;

    // Plan and Reflect each cost one driver call per transition, plus one
    // summary call; the ceiling caps the total
    assert!(driver.call_count() <= ceiling + 1);
}

// ============================================================================
// Single-call-per-cycle policy
// ============================================================================

#[tokio::test]
async fn test_only_first_tool_call_is_serviced() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let registry = ToolRegistry::builder()
        .tool(ListTablesTool {
            invocations: invocations.clone(),
        })
        .tool(EchoTool)
        .build();

    let driver = ScriptedLlmDriver::new(vec![
        // Plan emits two calls in one turn; only the first is honored
        LlmResponse::with_tool_calls(
            "",
            vec![
                call("call_1", "describe_database", json!({})),
                call("call_2", "echo", json!({"message": "never runs"})),
            ],
        ),
        LlmResponse::text("DONE."),
        LlmResponse::text("Listed the tables."),
    ]);

    let agent = Agent::new(driver, registry, AgentConfig::default());
    let answer = agent.process("What tables exist?").await;

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(answer, "Listed the tables.");
}

// ============================================================================
// Termination defaults
// ============================================================================

#[tokio::test]
async fn test_plain_text_plan_goes_straight_to_finish() {
    let registry = ToolRegistry::new();

    let driver = ScriptedLlmDriver::new(vec![
        // Plan answers directly with no tool call
        LlmResponse::text("No tools needed for that."),
        // Finish summary
        LlmResponse::text("Nothing to do."),
    ]);

    let agent = Agent::new(driver, registry, AgentConfig::default());
    let answer = agent.process("Say hello").await;

    assert_eq!(answer, "Nothing to do.");
}

#[tokio::test]
async fn test_reflect_without_marker_or_calls_finishes() {
    let registry = ToolRegistry::builder().tool(EchoTool).build();

    let driver = ScriptedLlmDriver::new(vec![
        LlmResponse::with_tool_calls("", vec![call("c1", "echo", json!({"message": "x"}))]),
        // Reflect reply: no marker, no tool calls -> fail safe to Finish
        LlmResponse::text("Hmm, let me think about what comes next."),
        LlmResponse::text("Echoed once."),
    ]);

    let agent = Agent::new(driver, registry, AgentConfig::default());
    let answer = agent.process("Echo x").await;

    assert_eq!(answer, "Echoed once.");
}

#[tokio::test]
async fn test_driver_failure_degrades_to_error_answer() {
    struct BrokenDriver;

    #[async_trait]
    impl sqlsage_core::LlmDriver for BrokenDriver {
        async fn chat_completion(
            &self,
            _messages: Vec<sqlsage_core::LlmMessage>,
            _config: &sqlsage_core::LlmCallConfig,
        ) -> sqlsage_core::Result<LlmResponse> {
            Err(sqlsage_core::AgentError::llm("connection refused"))
        }
    }

    let agent = Agent::new(BrokenDriver, ToolRegistry::new(), AgentConfig::default());
    let answer = agent.process("Anything").await;

    assert!(answer.starts_with("I encountered an error:"));
    assert!(answer.contains("connection refused"));
}

#[tokio::test]
async fn test_empty_summary_gets_default_answer() {
    let driver = ScriptedLlmDriver::new(vec![
        LlmResponse::text("plain reply"),
        LlmResponse::text(""),
    ]);
    let agent = Agent::new(driver, ToolRegistry::new(), AgentConfig::default());
    let answer = agent.process("q").await;

    assert_eq!(answer, "I processed your request.");
}
