// Interaction logging
//
// Append-only audit trail of each model exchange plus the run's question and
// final answer. Not consulted for control decisions. Logging failures are
// warned and swallowed; they must never abort a run.

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::llm::{LlmMessage, LlmMessageRole, LlmResponse};

/// Opaque key identifying one run's log stream.
///
/// For the file logger this is the log file path; the noop logger ignores it.
#[derive(Debug, Clone)]
pub struct RunLogId(pub String);

/// Sink for per-run interaction records
#[async_trait]
pub trait InteractionLogger: Send + Sync {
    /// Open a log stream for a run and record the initial question
    async fn begin_run(&self, question: &str, model: &str) -> RunLogId;

    /// Record one model exchange (request messages and the response)
    async fn log_exchange(&self, run: &RunLogId, request: &[LlmMessage], response: &LlmResponse);

    /// Record the run's final answer or error
    async fn finish_run(&self, run: &RunLogId, outcome: &str);
}

// ============================================================================
// NoopInteractionLogger
// ============================================================================

/// Logger that records nothing (library and test default)
pub struct NoopInteractionLogger;

#[async_trait]
impl InteractionLogger for NoopInteractionLogger {
    async fn begin_run(&self, _question: &str, _model: &str) -> RunLogId {
        RunLogId(String::new())
    }

    async fn log_exchange(&self, _run: &RunLogId, _request: &[LlmMessage], _response: &LlmResponse) {
    }

    async fn finish_run(&self, _run: &RunLogId, _outcome: &str) {}
}

// ============================================================================
// FileInteractionLogger
// ============================================================================

/// Logger writing one `ask-<timestamp>.log` file per run.
///
/// Record format: a header with the question, then one INPUT/OUTPUT section
/// per model exchange including tool calls and token usage when the driver
/// reports it, then the final answer.
pub struct FileInteractionLogger {
    log_dir: std::path::PathBuf,
}

impl FileInteractionLogger {
    /// Create a logger writing into the given directory
    pub fn new(log_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    async fn append(&self, run: &RunLogId, text: &str) {
        if run.0.is_empty() {
            return;
        }
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&run.0)
                .await?;
            file.write_all(text.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(path = %run.0, error = %e, "failed to append interaction log");
        }
    }
}

fn role_label(role: &LlmMessageRole) -> &'static str {
    match role {
        LlmMessageRole::System => "System",
        LlmMessageRole::User => "User",
        LlmMessageRole::Assistant => "Assistant",
        LlmMessageRole::Tool => "Tool",
    }
}

const SEPARATOR: &str =
    "================================================================================\n";

#[async_trait]
impl InteractionLogger for FileInteractionLogger {
    async fn begin_run(&self, question: &str, model: &str) -> RunLogId {
        if let Err(e) = tokio::fs::create_dir_all(&self.log_dir).await {
            warn!(dir = %self.log_dir.display(), error = %e, "failed to create log directory");
            return RunLogId(String::new());
        }

        let now = Utc::now();
        let stamp = now.format("%Y-%m-%d-%H-%M-%S");
        // Short uuid suffix keeps concurrent runs in distinct files
        let suffix = uuid::Uuid::now_v7().simple().to_string();
        let path = self
            .log_dir
            .join(format!("ask-{}-{}.log", stamp, &suffix[..8]));
        let run = RunLogId(path.to_string_lossy().into_owned());

        let header = format!(
            "Question: {}\nTimestamp: {}\nModel: {}\n{}",
            question,
            now.to_rfc3339(),
            model,
            SEPARATOR
        );
        self.append(&run, &header).await;
        run
    }

    async fn log_exchange(&self, run: &RunLogId, request: &[LlmMessage], response: &LlmResponse) {
        let mut record = String::new();
        record.push('\n');
        record.push_str(SEPARATOR);
        record.push_str(&format!("Timestamp: {}\n", Utc::now().to_rfc3339()));
        record.push_str("Direction: INPUT\nMessages:\n");
        for msg in request {
            record.push_str(&format!("  - {}: {}\n", role_label(&msg.role), msg.content));
            if let Some(calls) = &msg.tool_calls {
                for call in calls {
                    record.push_str(&format!(
                        "    Tool Call: {} {}\n",
                        call.name, call.arguments
                    ));
                }
            }
        }

        record.push_str("\nDirection: OUTPUT\n");
        record.push_str(&format!("Response: {}\n", response.text));
        if let Some(calls) = &response.tool_calls {
            for call in calls {
                record.push_str(&format!("Tool Call: {} {}\n", call.name, call.arguments));
            }
        }

        let usage = &response.metadata;
        if usage.total_tokens.is_some() || usage.prompt_tokens.is_some() {
            record.push_str("\nToken Usage:\n");
            record.push_str(&format!(
                "  - Input Tokens: {}\n",
                usage
                    .prompt_tokens
                    .map_or("N/A".to_string(), |t| t.to_string())
            ));
            record.push_str(&format!(
                "  - Output Tokens: {}\n",
                usage
                    .completion_tokens
                    .map_or("N/A".to_string(), |t| t.to_string())
            ));
            record.push_str(&format!(
                "  - Total Tokens: {}\n",
                usage
                    .total_tokens
                    .map_or("N/A".to_string(), |t| t.to_string())
            ));
        }
        record.push_str(SEPARATOR);

        self.append(run, &record).await;
    }

    async fn finish_run(&self, run: &RunLogId, outcome: &str) {
        let record = format!(
            "\n{}FINAL ANSWER:\n{}\nCompleted at: {}\n",
            SEPARATOR,
            outcome,
            Utc::now().to_rfc3339()
        );
        self.append(run, &record).await;
    }
}
