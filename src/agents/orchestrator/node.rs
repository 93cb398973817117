//! Node agent - one node's select-then-take step.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::leaf::{ActionRunner, ActionSelector};
use crate::agents::{Agent, AgentContext, AgentError, AgentId, AgentResult, AgentType};
use crate::task::TaskNode;

/// Selects an action for a node, then takes it.
///
/// Does not descend into children; the root agent drives the traversal.
pub struct NodeAgent {
    id: AgentId,
    selector: ActionSelector,
    runner: ActionRunner,
}

impl NodeAgent {
    pub fn new() -> Self {
        Self {
            id: AgentId::new(),
            selector: ActionSelector::new(),
            runner: ActionRunner::new(),
        }
    }

    /// The runner, for callers that choose the action themselves.
    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }
}

impl Default for NodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for NodeAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Node
    }

    fn description(&self) -> &str {
        "Selects and takes one action for a task node"
    }

    async fn execute(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        tracing::debug!("NodeAgent working on node {} (level {})", node.id, node.level);
        let (kind, _) = self.selector.select(node, ctx).await?;
        let result = self.runner.take_action(node, ctx).await?;
        let data = json!({
            "action": kind.name(),
            "take": result.data,
        });
        Ok(result.with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{code_response, context, ScriptedLlm, ScriptedSandbox};
    use crate::task::ActionKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn selects_then_takes() {
        let llm = Arc::new(ScriptedLlm::new([
            "**2** code gives concrete results".to_string(),
            code_response("print('hello')"),
            "Printed hello.".to_string(),
        ]));
        let sandbox = Arc::new(ScriptedSandbox::default());
        let (_dir, ctx) = context(llm.clone(), sandbox.clone());
        let mut node = TaskNode::root("Say hello", "info", "test-model", 2);

        let result = NodeAgent::new().execute(&mut node, &ctx).await.unwrap();

        assert!(result.success);
        assert_eq!(node.chosen_action(), Some(ActionKind::WriteCode));
        assert_eq!(sandbox.executed(), vec!["print('hello')".to_string()]);
        assert_eq!(node.result(), Some("Printed hello."));
        assert_eq!(result.data.unwrap()["action"], "Write code");
    }
}
