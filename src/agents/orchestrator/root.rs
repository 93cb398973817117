//! Root agent - seeds the research tree and walks it depth-first.
//!
//! # Flow
//! 1. Build the level-0 node from the configured goal
//! 2. Force a brainstorm, then a divide, on the root
//! 3. Visit the children in pre-order: select, take, then descend before
//!    moving on to the next sibling
//! 4. Save the tree snapshot (also, best effort, when a model call fails)

use std::path::PathBuf;

use async_recursion::async_recursion;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::NodeAgent;
use crate::agents::{Agent, AgentContext, AgentError, AgentId, AgentResult, AgentType};
use crate::store::RunSnapshot;
use crate::task::{ActionKind, TaskNode};
use crate::util::preview;

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub root: TaskNode,
    pub result: AgentResult,
    pub snapshot_path: PathBuf,
}

/// Top of the tree: seeds the root node and drives every descendant.
///
/// Work is strictly serial; a later sibling sees everything earlier
/// siblings and their subtrees added to the shared lists and namespace.
pub struct RootAgent {
    id: AgentId,
    node_agent: NodeAgent,
}

impl RootAgent {
    pub fn new() -> Self {
        Self {
            id: AgentId::new(),
            node_agent: NodeAgent::new(),
        }
    }

    /// Run the whole tree and save its snapshot.
    ///
    /// # Errors
    /// A model-client or sandbox failure aborts the run; the partial tree is
    /// still saved before the error is returned.
    pub async fn run(&self, dataset_info: &str, ctx: &AgentContext) -> Result<RunReport, AgentError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut root = TaskNode::root(
            ctx.config.goal.as_str(),
            dataset_info,
            ctx.config.default_model.as_str(),
            ctx.config.max_depth,
        );
        tracing::info!("Starting run {} with model {}", run_id, root.model);

        let outcome = self.execute(&mut root, ctx).await;

        let saved = {
            let snapshot = RunSnapshot {
                run_id,
                started_at,
                finished_at: Utc::now(),
                goal: &root.goal,
                model: &root.model,
                dataset_info,
                functions: root.comments.snapshot(),
                tree: &root,
            };
            ctx.store.save_snapshot(&snapshot).await
        };

        match outcome {
            Ok(result) => {
                let snapshot_path = saved.map_err(|e| AgentError::StoreError(e.to_string()))?;
                Ok(RunReport {
                    root,
                    result,
                    snapshot_path,
                })
            }
            Err(e) => {
                if let Err(store_err) = saved {
                    tracing::warn!("Could not save partial task state: {}", store_err);
                }
                Err(e)
            }
        }
    }

    /// Brainstorm, then divide, on the root node.
    async fn seed(&self, root: &mut TaskNode, ctx: &AgentContext) -> Result<(), AgentError> {
        let runner = self.node_agent.runner();

        root.choose_action(ActionKind::Brainstorm)?;
        runner.take_action(root, ctx).await?;

        match root.choose_action(ActionKind::Divide) {
            Ok(()) => {
                runner.take_action(root, ctx).await?;
            }
            Err(e) => tracing::warn!("Not dividing the root task: {}", e),
        }
        Ok(())
    }

    #[async_recursion]
    async fn process_children(&self, node: &mut TaskNode, ctx: &AgentContext) -> Result<(), AgentError> {
        let total = node.children.len();
        for (i, child) in node.children.iter_mut().enumerate() {
            tracing::info!(
                "Subtask {}/{} at level {}: {}",
                i + 1,
                total,
                child.level,
                preview(&child.goal, 120)
            );
            let result = self.node_agent.execute(child, ctx).await?;
            if !result.success {
                tracing::warn!("Subtask {}/{} at level {}: {}", i + 1, total, child.level, result.output);
            }
            self.process_children(child, ctx).await?;
        }
        Ok(())
    }
}

impl Default for RootAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for RootAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Root
    }

    fn description(&self) -> &str {
        "Root orchestrator: seeds the tree, then visits every node depth-first"
    }

    async fn execute(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        self.seed(node, ctx).await?;
        self.process_children(node, ctx).await?;

        let nodes = node.subtree_size();
        tracing::info!("Research tree finished with {} nodes", nodes);
        Ok(AgentResult::success(format!("visited {} nodes", nodes)).with_data(json!({
            "nodes": nodes,
            "ideas": node.ideas.len(),
            "functions": node.comments.len(),
        })))
    }
}
