//! Agents module - drives the research tree.
//!
//! # Agent Types
//! - **RootAgent**: seeds the root node (brainstorm, then divide) and walks
//!   the tree depth-first
//! - **NodeAgent**: one node's select-then-take step
//! - **ActionSelector**: asks the model which action a node should take
//! - **ActionRunner**: prompts for the chosen action and applies the reply
//! - **Summarizer**: records a one-off summary of what a node accomplished
//!
//! `CodeDebugger` is not an agent; the runner uses it to execute and repair
//! generated code.
//!
//! # Failure model
//! Parse failures, repair-budget exhaustion and execution errors are
//! reported as `AgentResult { success: false, .. }` and the run goes on.
//! Model-client and sandbox-transport failures are `AgentError` and abort.

mod context;
pub mod leaf;
pub mod orchestrator;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use context::AgentContext;
pub use leaf::{ActionRunner, ActionSelector, CodeDebugger, RepairOutcome, Summarizer};
pub use orchestrator::{NodeAgent, RootAgent, RunReport};
pub use types::{AgentError, AgentId, AgentResult, AgentType};

use async_trait::async_trait;

use crate::task::TaskNode;

/// Base trait for all agents.
///
/// # Invariants
/// - `execute()` never panics; aborting failures are returned as `Err`
/// - A recoverable failure is `Ok` with `success == false`
#[async_trait]
pub trait Agent: Send + Sync {
    /// Get the unique identifier for this agent.
    fn id(&self) -> &AgentId;

    /// Get the type/role of this agent.
    fn agent_type(&self) -> AgentType;

    /// Work on a task node.
    ///
    /// # Errors
    /// Returns `Err` if the model client or the sandbox transport fails, or
    /// the node is in a state the agent cannot work with.
    async fn execute(&self, node: &mut TaskNode, ctx: &AgentContext) -> Result<AgentResult, AgentError>;

    /// Get a human-readable description of this agent.
    fn description(&self) -> &str {
        "Generic agent"
    }
}
