// Agent Control Loop
//
// The Plan -> Execute -> Reflect -> Finish state machine. Plan asks the
// model what to do, Execute services one tool call, Reflect asks the model
// to judge progress, and the gate after Reflect routes back to Plan or on
// to Finish. Two independent bounds guarantee termination: the error bound
// (tool failures) and the step ceiling (total transitions).

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::classifier::{CompletionClassifier, DoneMarkerClassifier};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::llm::{LlmCallConfig, LlmDriver, LlmMessage};
use crate::logger::{InteractionLogger, NoopInteractionLogger, RunLogId};
use crate::message::Message;
use crate::tool_types::{ToolDefinition, ToolResult};
use crate::tools::ToolRegistry;

const REFLECT_NEXT_PROMPT: &str = "Is the original question fully answered? \
If yes, say 'DONE' and provide a final answer. If no, what's the next action?";

const REFLECT_RECOVER_PROMPT: &str =
    "How should we recover from this error? What is the corrected approach?";

const FINISH_PROMPT: &str =
    "Provide a clear, natural language summary of what was accomplished.";

// ============================================================================
// Run State
// ============================================================================

/// Control-loop phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Plan,
    Execute,
    Reflect,
    Finish,
}

/// One executed tool call and its result (newest last in the history)
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub tool: String,
    pub arguments: Value,
    pub result: ToolResult,
}

/// Working memory for one run.
///
/// Owned exclusively by one execution of the control loop and discarded
/// after the final answer is produced.
#[derive(Debug)]
pub struct RunState {
    /// The original question (immutable for the run)
    pub question: String,
    /// Full conversation, append-only
    pub messages: Vec<Message>,
    /// Current phase
    pub phase: Phase,
    /// Executed tool calls, newest last
    pub tool_outcomes: Vec<ToolOutcome>,
    /// Execute-phase failures so far
    pub error_count: u32,
    /// Error bound
    pub max_errors: u32,
    /// Final answer (empty until Finish)
    pub final_answer: String,
}

impl RunState {
    fn new(question: impl Into<String>, max_errors: u32) -> Self {
        Self {
            question: question.into(),
            messages: Vec::new(),
            phase: Phase::Plan,
            tool_outcomes: Vec::new(),
            error_count: 0,
            max_errors,
            final_answer: String::new(),
        }
    }

    fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

// ============================================================================
// Agent
// ============================================================================

/// The natural-language-to-database agent.
///
/// Holds the process-wide collaborators (LLM driver, tool registry, logger);
/// each `process` call owns its RunState, so concurrent runs are independent.
pub struct Agent<D: LlmDriver> {
    driver: D,
    registry: ToolRegistry,
    config: AgentConfig,
    classifier: Arc<dyn CompletionClassifier>,
    logger: Arc<dyn InteractionLogger>,
}

impl<D: LlmDriver> Agent<D> {
    /// Create an agent with the default classifier and no logging
    pub fn new(driver: D, registry: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            driver,
            registry,
            config,
            classifier: Arc::new(DoneMarkerClassifier::default()),
            logger: Arc::new(NoopInteractionLogger),
        }
    }

    /// Set the interaction logger
    pub fn with_logger(mut self, logger: Arc<dyn InteractionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set the completion classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn CompletionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Process one question and return a natural-language answer.
    ///
    /// Never propagates a fault to the caller: any error inside the run
    /// degrades to a textual error answer.
    pub async fn process(&self, question: &str) -> String {
        let run_log = self.logger.begin_run(question, &self.config.model).await;

        let answer = match self.run(question, &run_log).await {
            Ok(answer) => answer,
            Err(e) => format!("I encountered an error: {}", e),
        };

        self.logger.finish_run(&run_log, &answer).await;
        answer
    }

    /// Drive the state machine for one question.
    ///
    /// The loop body counts every transition against the step ceiling, so a
    /// model that never signals completion and never errors still terminates.
    async fn run(&self, question: &str, run_log: &RunLogId) -> Result<String> {
        let mut state = RunState::new(question, self.config.max_errors);
        let mut steps = 0usize;

        while state.phase != Phase::Finish {
            if steps >= self.config.step_ceiling {
                debug!(steps, "step ceiling reached, forcing finish");
                state.phase = Phase::Finish;
                break;
            }
            steps += 1;

            match state.phase {
                Phase::Plan => self.plan(&mut state, run_log).await?,
                Phase::Execute => self.execute(&mut state).await,
                Phase::Reflect => {
                    self.reflect(&mut state, run_log).await?;
                    self.reflect_gate(&mut state);
                }
                Phase::Finish => unreachable!("loop exits before entering Finish"),
            }
        }

        // The summary runs even when the loop was forced here by a bound,
        // so partial progress still yields an answer.
        self.finish(&mut state, run_log).await?;
        Ok(state.final_answer)
    }

    /// Plan: ask the model what to do given the question and prior results
    async fn plan(&self, state: &mut RunState, run_log: &RunLogId) -> Result<()> {
        let mut request = vec![
            LlmMessage::from(&Message::system(&self.config.system_prompt)),
            LlmMessage::from(&Message::user(format!("Question: {}", state.question))),
        ];

        if !state.tool_outcomes.is_empty() {
            let context = state
                .tool_outcomes
                .iter()
                .map(|outcome| format!("Previous result: {}", outcome_json(outcome)))
                .collect::<Vec<_>>()
                .join("\n");
            request.push(LlmMessage::from(&Message::user(format!(
                "Context from previous actions:\n{}",
                context
            ))));
        }

        let response = self
            .driver
            .chat_completion(request.clone(), &self.call_config(self.registry.definitions()))
            .await?;
        self.logger.log_exchange(run_log, &request, &response).await;

        let message = response.into_message();
        let next = if is_well_formed_call(&message) {
            Phase::Execute
        } else {
            Phase::Finish
        };
        state.messages.push(message);
        state.phase = next;
        Ok(())
    }

    /// Execute: service the first tool call of the last assistant message.
    ///
    /// Only one call is honored per cycle; any further calls in the same
    /// turn are discarded. Failures are recoverable: they increment the
    /// error counter and still advance to Reflect.
    async fn execute(&self, state: &mut RunState) {
        let Some(call) = state.last_message().and_then(|m| m.first_tool_call()).cloned() else {
            state.phase = Phase::Finish;
            return;
        };

        if let Some(calls) = state.last_message().and_then(|m| m.tool_calls.as_ref()) {
            if calls.len() > 1 {
                debug!(
                    discarded = calls.len() - 1,
                    "servicing only the first tool call of this turn"
                );
            }
        }

        let result = self.registry.invoke_call(&call).await;
        if !result.success {
            state.error_count += 1;
        }

        state
            .messages
            .push(Message::tool_result(&call.id, result.to_json().to_string()));
        state.tool_outcomes.push(ToolOutcome {
            tool: call.name,
            arguments: call.arguments,
            result,
        });
        state.phase = Phase::Reflect;
    }

    /// Reflect: ask the model whether the question is answered or how to
    /// recover from the last failure
    async fn reflect(&self, state: &mut RunState, run_log: &RunLogId) -> Result<()> {
        let mut request = vec![
            LlmMessage::from(&Message::system(&self.config.system_prompt)),
            LlmMessage::from(&Message::user(format!(
                "Original question: {}",
                state.question
            ))),
        ];

        match state.tool_outcomes.last() {
            Some(outcome) if outcome.result.success => {
                request.push(LlmMessage::from(&Message::user(format!(
                    "Last action result: {}",
                    outcome_json(outcome)
                ))));
                request.push(LlmMessage::from(&Message::user(REFLECT_NEXT_PROMPT)));
            }
            Some(outcome) => {
                let error = outcome.result.error.as_deref().unwrap_or("Unknown error");
                request.push(LlmMessage::from(&Message::user(format!(
                    "Error occurred: {}",
                    error
                ))));
                request.push(LlmMessage::from(&Message::user(REFLECT_RECOVER_PROMPT)));
            }
            None => {
                request.push(LlmMessage::from(&Message::user(REFLECT_NEXT_PROMPT)));
            }
        }

        let response = self
            .driver
            .chat_completion(request.clone(), &self.call_config(self.registry.definitions()))
            .await?;
        self.logger.log_exchange(run_log, &request, &response).await;

        state.messages.push(response.into_message());
        Ok(())
    }

    /// Gate after Reflect: error bound, then completion signal, then retry.
    ///
    /// Defaults toward termination: anything unrecognized finishes the run.
    fn reflect_gate(&self, state: &mut RunState) {
        if state.error_count >= state.max_errors {
            debug!(errors = state.error_count, "error bound reached");
            state.phase = Phase::Finish;
            return;
        }

        let Some(reply) = state.last_message() else {
            state.phase = Phase::Finish;
            return;
        };

        if self.classifier.is_complete(reply) {
            state.phase = Phase::Finish;
        } else if reply.has_tool_calls() {
            state.phase = Phase::Plan;
        } else {
            state.phase = Phase::Finish;
        }
    }

    /// Finish: summarize the run's outcomes as the final answer
    async fn finish(&self, state: &mut RunState, run_log: &RunLogId) -> Result<()> {
        let results = serde_json::to_string(&state.tool_outcomes).unwrap_or_default();
        let request = vec![
            LlmMessage::from(&Message::system(&self.config.system_prompt)),
            LlmMessage::from(&Message::user(format!(
                "Original question: {}",
                state.question
            ))),
            LlmMessage::from(&Message::user(format!("All results: {}", results))),
            LlmMessage::from(&Message::user(FINISH_PROMPT)),
        ];

        // No tool catalog here: the summary turn should not request calls
        let response = self
            .driver
            .chat_completion(request.clone(), &self.call_config(Vec::new()))
            .await?;
        self.logger.log_exchange(run_log, &request, &response).await;

        state.final_answer = if response.text.is_empty() {
            "I processed your request.".to_string()
        } else {
            response.text
        };
        state.phase = Phase::Finish;
        Ok(())
    }

    fn call_config(&self, tools: Vec<ToolDefinition>) -> LlmCallConfig {
        LlmCallConfig {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools,
        }
    }
}

/// A tool call is well-formed when it names a tool and carries an argument
/// object (or nothing, for zero-parameter tools)
fn is_well_formed_call(message: &Message) -> bool {
    match message.first_tool_call() {
        Some(call) => !call.name.is_empty() && (call.arguments.is_object() || call.arguments.is_null()),
        None => false,
    }
}

fn outcome_json(outcome: &ToolOutcome) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|_| "{}".to_string())
}
