//! Action selection - asks the model which action a node should take.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::{Agent, AgentContext, AgentError, AgentId, AgentResult, AgentType};
use crate::history::HistoryScope;
use crate::parse::parse_action_selection;
use crate::task::{prompts, ActionKind, TaskNode};
use crate::util::combine_prompts;

/// Picks one action from the node's catalog.
///
/// # Retry policy
/// At most `1 + n_select_retries` model calls. An answer without a `** **`
/// integer, or one outside `1..=len`, is retried; when every attempt fails
/// the first action in the catalog is used. Selection never fails the node.
pub struct ActionSelector {
    id: AgentId,
}

impl ActionSelector {
    pub fn new() -> Self {
        Self { id: AgentId::new() }
    }

    /// Selection prompt: preamble, goal, history, numbered catalog.
    pub fn build_prompt(node: &TaskNode, history: &str) -> String {
        let choices = node
            .actions()
            .iter()
            .enumerate()
            .map(|(i, action)| format!("{}. {}: {}", i + 1, action.kind.name(), action.selection_hint))
            .collect::<Vec<_>>()
            .join("\n");
        let instructions = format!(
            "{}{}{}",
            prompts::SELECT_INSTRUCTIONS,
            choices,
            prompts::SELECT_ANSWER_FORMAT
        );
        combine_prompts(&[prompts::SELECT_PREAMBLE, node.goal.as_str(), history, instructions.as_str()])
    }

    /// Choose an action for `node` and record it.
    ///
    /// Returns the chosen action and the number of model calls made.
    pub async fn select(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<(ActionKind, usize), AgentError> {
        tracing::info!("Selecting action for a node at level {}", node.level);

        let history = ctx.history.compose(
            &node.ideas.snapshot(),
            &node.comments.snapshot(),
            &node.dataset_info,
            HistoryScope::SELECTION,
        );
        let prompt = Self::build_prompt(node, &history);

        let attempts = 1 + ctx.limits().n_select_retries;
        for attempt in 1..=attempts {
            let response = ctx.chat(&node.model, &prompt).await?;
            let choice = parse_action_selection(&response)
                .and_then(|number| node.actions().get_numbered(number))
                .map(|action| action.kind);

            match choice {
                Some(kind) => {
                    node.choose_action(kind)?;
                    tracing::info!("LM action selected: {}", kind);
                    return Ok((kind, attempt));
                }
                None => {
                    tracing::warn!(
                        "Unusable action selection (attempt {}/{})",
                        attempt,
                        attempts
                    );
                }
            }
        }

        let fallback = node
            .actions()
            .first()
            .map(|action| action.kind)
            .ok_or_else(|| AgentError::TaskError("node has no actions".to_string()))?;
        node.choose_action(fallback)?;
        tracing::info!("LM action failed to select, using: {}", fallback);
        Ok((fallback, attempts))
    }
}

impl Default for ActionSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ActionSelector {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::ActionSelector
    }

    fn description(&self) -> &str {
        "Asks the model which action a node should take"
    }

    async fn execute(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        let (kind, calls) = self.select(node, ctx).await?;
        Ok(AgentResult::success(kind.name()).with_data(json!({
            "action": kind.name(),
            "model_calls": calls,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{context, ScriptedLlm, ScriptedSandbox};
    use crate::task::SharedList;
    use std::sync::Arc;

    fn node_at(level: usize, max_depth: usize) -> TaskNode {
        TaskNode::new(
            level,
            max_depth,
            "Find direction tuning.".to_string(),
            SharedList::from_vec(vec!["idea A".to_string()]),
            SharedList::new(),
            "MT recording".to_string(),
            "test-model".to_string(),
        )
    }

    #[test]
    fn prompt_lists_numbered_actions() {
        let node = node_at(0, 2);
        let prompt = ActionSelector::build_prompt(&node, "HISTORY");
        assert!(prompt.starts_with("You are thinking about the following task. \n\nFind direction tuning.\n\nHISTORY\n\nInstructions:"));
        assert!(prompt.contains("\n1. Brainstorm: Brainstorm ideas"));
        assert!(prompt.contains("\n2. Write code: Write Python code"));
        assert!(prompt.contains("\n3. Divide task into smaller subtasks: If the task"));
        assert!(prompt.contains("enclosed in ** **"));
    }

    #[test]
    fn prompt_at_max_depth_has_two_actions() {
        let node = node_at(2, 2);
        let prompt = ActionSelector::build_prompt(&node, "");
        assert!(prompt.contains("2. Write code"));
        assert!(!prompt.contains("3. "));
        assert!(!prompt.contains("Divide task into smaller subtasks"));
    }

    #[tokio::test]
    async fn valid_answer_is_recorded() {
        let llm = Arc::new(ScriptedLlm::new(["I pick **2** to get numbers."]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_at(0, 2);

        let (kind, calls) = ActionSelector::new().select(&mut node, &ctx).await.unwrap();
        assert_eq!(kind, ActionKind::WriteCode);
        assert_eq!(calls, 1);
        assert_eq!(node.chosen_action(), Some(ActionKind::WriteCode));
        assert!(llm.prompts()[0].contains("You have already brainstormed the following ideas:\nidea A"));
    }

    #[tokio::test]
    async fn out_of_range_answers_are_retried() {
        let llm = Arc::new(ScriptedLlm::new(["**0**", "**4**", "no idea", "**3**"]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_at(0, 2);

        let (kind, calls) = ActionSelector::new().select(&mut node, &ctx).await.unwrap();
        assert_eq!(kind, ActionKind::Divide);
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn divide_number_is_out_of_range_at_max_depth() {
        let llm = Arc::new(ScriptedLlm::new(["**3**", "**1**"]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_at(2, 2);

        let (kind, _) = ActionSelector::new().select(&mut node, &ctx).await.unwrap();
        assert_eq!(kind, ActionKind::Brainstorm);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_first_action_after_all_attempts() {
        let attempts = 1 + crate::config::RetryLimits::default().n_select_retries;
        let llm = Arc::new(ScriptedLlm::new(vec!["nothing useful"; attempts]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_at(1, 2);

        let result = ActionSelector::new().execute(&mut node, &ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(node.chosen_action(), Some(ActionKind::Brainstorm));
        assert_eq!(llm.call_count(), attempts);
        assert_eq!(llm.remaining(), 0);
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let llm = Arc::new(ScriptedLlm::new(Vec::<String>::new()));
        let (_dir, ctx) = context(llm, Arc::new(ScriptedSandbox::default()));
        let mut node = node_at(0, 2);
        let err = ActionSelector::new().select(&mut node, &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }
}
