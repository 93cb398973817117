//! Summarizer - records what a node accomplished.

use async_trait::async_trait;

use crate::agents::{Agent, AgentContext, AgentError, AgentId, AgentResult, AgentType};
use crate::task::{prompts, TaskNode};

/// Asks the model for a summary of the node's work and stores the raw reply.
///
/// Idempotent: a node that already has a result is left untouched and no
/// model call is made.
pub struct Summarizer {
    id: AgentId,
}

impl Summarizer {
    pub fn new() -> Self {
        Self { id: AgentId::new() }
    }

    /// Returns whether a new summary was written.
    pub async fn summarize(&self, node: &mut TaskNode, ctx: &AgentContext) -> Result<bool, AgentError> {
        if node.result().is_some() {
            return Ok(false);
        }
        let response = ctx.chat(&node.model, &prompts::summarize(&node.goal)).await?;
        Ok(node.set_result(response))
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for Summarizer {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Summarizer
    }

    fn description(&self) -> &str {
        "Summarizes a node's work for later nodes"
    }

    async fn execute(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        let written = self.summarize(node, ctx).await?;
        Ok(AgentResult::success(if written {
            "summary written"
        } else {
            "summary already present"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{context, ScriptedLlm, ScriptedSandbox};
    use std::sync::Arc;

    #[tokio::test]
    async fn second_summary_is_a_no_op() {
        let llm = Arc::new(ScriptedLlm::new(["I plotted tuning curves to ./outputs/tuning.png"]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = TaskNode::root("Plot tuning curves", "info", "test-model", 2);
        let summarizer = Summarizer::new();

        assert!(summarizer.summarize(&mut node, &ctx).await.unwrap());
        assert!(!summarizer.summarize(&mut node, &ctx).await.unwrap());

        assert_eq!(llm.call_count(), 1);
        assert_eq!(node.result(), Some("I plotted tuning curves to ./outputs/tuning.png"));
        assert!(llm.prompts()[0].starts_with("Your task was to: Plot tuning curves\n\n"));
    }
}
