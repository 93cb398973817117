//! Agent execution context - shared state across the research tree.

use std::sync::Arc;

use super::AgentError;
use crate::config::{Config, RetryLimits};
use crate::history::HistoryComposer;
use crate::llm::{ChatMessage, LlmClient};
use crate::sandbox::{CodeSandbox, ExecOutcome};
use crate::store::RunStore;
use crate::util::preview;

const LOG_PREVIEW_CHARS: usize = 2000;

/// Shared context passed to all agents during a run.
///
/// # Thread Safety
/// The run is driven by a single task; the sandbox is still behind `Arc` so
/// test doubles and the real interpreter are interchangeable.
pub struct AgentContext {
    /// Application configuration
    pub config: Config,

    /// Model client
    pub llm: Arc<dyn LlmClient>,

    /// The run's one execution namespace
    pub sandbox: Arc<dyn CodeSandbox>,

    pub history: HistoryComposer,

    pub store: RunStore,
}

impl AgentContext {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>, sandbox: Arc<dyn CodeSandbox>) -> Self {
        let history = HistoryComposer::new(config.results_file.clone());
        let store = RunStore::new(config.log_dir.clone());
        Self {
            config,
            llm,
            sandbox,
            history,
            store,
        }
    }

    pub fn limits(&self) -> RetryLimits {
        self.config.limits
    }

    /// Single-prompt model call.
    pub async fn chat(&self, model: &str, prompt: &str) -> Result<String, AgentError> {
        tracing::debug!("Prompt:\n{}", preview(prompt, LOG_PREVIEW_CHARS));
        let response = self
            .llm
            .chat(model, prompt)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;
        tracing::debug!("Response:\n{}", preview(&response, LOG_PREVIEW_CHARS));
        Ok(response)
    }

    /// Multi-turn model call; returns the text of the final reply.
    pub async fn chat_messages(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, AgentError> {
        if let Some(last) = messages.last() {
            tracing::debug!("Prompt (turn {}):\n{}", messages.len(), preview(&last.content, LOG_PREVIEW_CHARS));
        }
        let response = self
            .llm
            .chat_completion(model, messages)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;
        let content = response.content.unwrap_or_default();
        tracing::debug!("Response:\n{}", preview(&content, LOG_PREVIEW_CHARS));
        Ok(content)
    }

    /// Run code in the shared namespace.
    pub async fn execute_code(&self, code: &str) -> Result<ExecOutcome, AgentError> {
        self.sandbox
            .execute(code)
            .await
            .map_err(|e| AgentError::SandboxError(e.to_string()))
    }
}
