//! Core types for the agent system.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Create a new unique agent ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    /// Seeds the tree and walks it
    Root,
    /// Runs select-then-take for one node
    Node,
    ActionSelector,
    ActionRunner,
    Summarizer,
}

/// Result of an agent working on a task node.
///
/// # Invariants
/// - `success == false` is a reported, non-fatal failure; the run goes on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the agent achieved what it set out to do
    pub success: bool,

    /// Short human-readable outcome
    pub output: String,

    /// Detailed result data (agent-specific)
    pub data: Option<serde_json::Value>,
}

impl AgentResult {
    /// Create a successful result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// Create a failure result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: error.into(),
            data: None,
        }
    }

    /// Add additional data to the result.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Errors that abort the run.
///
/// Everything the tree can recover from is an `AgentResult` with
/// `success == false` instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Sandbox error: {0}")]
    SandboxError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

impl From<crate::task::TaskError> for AgentError {
    fn from(e: crate::task::TaskError) -> Self {
        Self::TaskError(e.to_string())
    }
}
