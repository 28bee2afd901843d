// Scripted LLM driver
//
// Fake driver for tests and examples: replays a configured sequence of
// responses, one per chat_completion call. Once the script is exhausted it
// keeps returning a fixed fallback, so loop bounds can be exercised against
// a model that "never finishes".

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::Result;
use crate::llm::{LlmCallConfig, LlmDriver, LlmMessage, LlmResponse};

/// Driver that replays canned responses in order
pub struct ScriptedLlmDriver {
    script: Mutex<VecDeque<LlmResponse>>,
    fallback: LlmResponse,
    calls: AtomicUsize,
}

impl ScriptedLlmDriver {
    /// Create a driver that replays the given responses in order
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: LlmResponse::text("I processed your request."),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set the response returned after the script runs out
    pub fn with_fallback(mut self, fallback: LlmResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of chat_completion calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmDriver for ScriptedLlmDriver {
    async fn chat_completion(
        &self,
        _messages: Vec<LlmMessage>,
        _config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        Ok(script.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}
