//! Scripted model and sandbox doubles for agent tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::AgentContext;
use crate::config::Config;
use crate::llm::{ChatMessage, ChatResponse, LlmClient};
use crate::sandbox::{CodeSandbox, ExecFailure, ExecOutcome};

/// Model that answers from a queue and records every conversation it sees.
///
/// An exhausted queue is an error, so tests notice unexpected extra calls.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Last message of every call, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|messages| messages.last().map(|m| m.content.clone()).unwrap_or_default())
            .collect()
    }

    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted model has no response left"))?;
        Ok(ChatResponse {
            content: Some(content),
            ..Default::default()
        })
    }
}

/// Sandbox that replays scripted outcomes and records executed code.
///
/// Once the script runs out every execution succeeds.
#[derive(Default)]
pub struct ScriptedSandbox {
    outcomes: Mutex<VecDeque<ExecOutcome>>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedSandbox {
    pub fn new(outcomes: impl IntoIterator<Item = ExecOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeSandbox for ScriptedSandbox {
    async fn execute(&self, code: &str) -> anyhow::Result<ExecOutcome> {
        self.executed.lock().unwrap().push(code.to_string());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ExecOutcome::Success {
                stdout: String::new(),
            }))
    }
}

pub fn success() -> ExecOutcome {
    ExecOutcome::Success {
        stdout: String::new(),
    }
}

pub fn runtime_error(detail: &str) -> ExecOutcome {
    ExecOutcome::Failure(ExecFailure::Runtime {
        detail: detail.to_string(),
    })
}

pub fn missing_module(module: &str) -> ExecOutcome {
    ExecOutcome::Failure(ExecFailure::DependencyMissing {
        module: module.to_string(),
        detail: format!("ModuleNotFoundError: No module named '{}'", module),
    })
}

/// Context over the given doubles, rooted in a fresh temporary workspace.
pub fn context(
    llm: Arc<ScriptedLlm>,
    sandbox: Arc<ScriptedSandbox>,
) -> (tempfile::TempDir, AgentContext) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(
        String::new(),
        "test-model".to_string(),
        dir.path().to_path_buf(),
    );
    (dir, AgentContext::new(config, llm, sandbox))
}

/// Response carrying a fenced code block.
pub fn code_response(code: &str) -> String {
    format!("Here you go:\n```python\n{}\n```", code)
}

/// Response carrying a fenced JSON block.
pub fn json_response(value: serde_json::Value) -> String {
    format!("```json\n{}\n```", value)
}
