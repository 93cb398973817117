//! Take-action - prompts for the chosen action, parses the reply and applies it.

use async_trait::async_trait;
use serde_json::json;

use super::{CodeDebugger, Summarizer};
use crate::agents::{Agent, AgentContext, AgentError, AgentId, AgentResult, AgentType};
use crate::llm::ChatMessage;
use crate::parse::{
    function_sources, parse_code, parse_function_comments, parse_ideas, parse_subtasks, SubtaskDef,
};
use crate::task::{ActionDefinition, ActionKind, SharedList, TaskNode};
use crate::util::{combine_prompts, preview};

/// A model reply that parsed for its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAction {
    Ideas(Vec<String>),
    Code(String),
    Subtasks(Vec<SubtaskDef>),
}

impl ParsedAction {
    pub fn parse(kind: ActionKind, response: &str) -> Option<Self> {
        match kind {
            ActionKind::Brainstorm => parse_ideas(response).map(Self::Ideas),
            ActionKind::WriteCode => parse_code(response).map(Self::Code),
            ActionKind::Divide => parse_subtasks(response).map(Self::Subtasks),
        }
    }
}

/// Carries out the node's chosen action.
///
/// # Retry policy
/// At most `1 + n_take_retries` prompt-and-parse attempts. If none parses,
/// the action is abandoned with a warning: no effect, no summary, and a
/// failed `AgentResult`. Once a reply parses, its effect is applied and the
/// node is always summarized, even if its code never ran cleanly.
pub struct ActionRunner {
    id: AgentId,
    debugger: CodeDebugger,
    summarizer: Summarizer,
}

impl ActionRunner {
    pub fn new() -> Self {
        Self {
            id: AgentId::new(),
            debugger: CodeDebugger::new(),
            summarizer: Summarizer::new(),
        }
    }

    /// Take-action prompt: action preamble with the goal, history, instructions.
    pub fn build_prompt(action: &ActionDefinition, goal: &str, history: &str) -> String {
        combine_prompts(&[
            format!("{}{}", action.prompt_start, goal),
            history.to_string(),
            action.prompt_end.clone(),
        ])
    }

    pub async fn take_action(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        let action = node
            .chosen_definition()
            .cloned()
            .ok_or_else(|| AgentError::TaskError("take action called before an action was chosen".to_string()))?;
        tracing::info!("Taking action {} for a node at level {}", action.kind, node.level);

        let attempts = 1 + ctx.limits().n_take_retries;
        let mut last_response = String::new();

        for attempt in 1..=attempts {
            let history = ctx.history.compose(
                &node.ideas.snapshot(),
                &node.comments.snapshot(),
                &node.dataset_info,
                action.kind.history_scope(),
            );
            let prompt = Self::build_prompt(&action, &node.goal, &history);
            let response = self.respond(&action, &prompt, &node.model, ctx).await?;

            match ParsedAction::parse(action.kind, &response) {
                Some(parsed) => {
                    let result = self.apply(parsed, &action, node, ctx).await?;
                    self.summarizer.summarize(node, ctx).await?;
                    return Ok(result);
                }
                None => {
                    tracing::info!(
                        "Parsing failed (attempt {}/{})... retrying",
                        attempt,
                        attempts
                    );
                    last_response = response;
                }
            }
        }

        tracing::warn!(
            "Take action is struggling with parsing the following model output: {}",
            preview(&last_response, 2000)
        );
        Ok(AgentResult::failure(format!(
            "{} output could not be parsed after {} attempts",
            action.kind, attempts
        ))
        .with_data(json!({ "action": action.kind.name(), "attempts": attempts })))
    }

    /// Initial reply, then `n_reflections` revision rounds.
    ///
    /// Each round shows the model the prompt, its latest reply and the
    /// revise instruction; the revised reply replaces the previous one.
    async fn respond(
        &self,
        action: &ActionDefinition,
        prompt: &str,
        model: &str,
        ctx: &AgentContext,
    ) -> Result<String, AgentError> {
        let mut response = ctx.chat(model, prompt).await?;
        if let Some(revise) = &action.revise_prompt {
            for _ in 0..ctx.limits().n_reflections {
                let conversation = [
                    ChatMessage::user(prompt),
                    ChatMessage::assistant(response.as_str()),
                    ChatMessage::user(revise.as_str()),
                ];
                response = ctx.chat_messages(model, &conversation).await?;
            }
        }
        Ok(response)
    }

    async fn apply(
        &self,
        parsed: ParsedAction,
        action: &ActionDefinition,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        match parsed {
            ParsedAction::Ideas(ideas) => {
                let count = ideas.len();
                node.ideas.extend(ideas);
                tracing::info!("Added {} ideas ({} shared in total)", count, node.ideas.len());
                Ok(AgentResult::success(format!("{} ideas", count)).with_data(json!({ "ideas": count })))
            }

            ParsedAction::Code(code) => {
                let prompts = action.debug.ok_or_else(|| {
                    AgentError::TaskError(format!("{} has no repair prompts", action.kind))
                })?;
                tracing::info!("Executing and debugging code...");
                let outcome = self.debugger.repair(code, &prompts, &node.model, ctx).await?;

                if !outcome.success {
                    node.failed = true;
                    return Ok(AgentResult::failure(format!(
                        "code still failing after {} repair steps",
                        outcome.debug_steps
                    ))
                    .with_data(json!({ "debug_steps": outcome.debug_steps })));
                }

                tracing::info!("Code ran successfully! Parsing the code...");
                let sources = function_sources(&outcome.code);
                if let Err(e) = ctx.store.append_functions(&sources).await {
                    tracing::warn!("Could not archive functions: {}", e);
                }
                let summaries = parse_function_comments(&outcome.code);
                let names: Vec<String> = summaries.iter().map(|s| s.name.clone()).collect();
                node.comments.extend(summaries);

                Ok(AgentResult::success(format!("code ran after {} step(s)", outcome.debug_steps))
                    .with_data(json!({
                        "debug_steps": outcome.debug_steps,
                        "functions": names,
                    })))
            }

            ParsedAction::Subtasks(subtasks) => {
                tracing::info!("Splitting tasks...");
                let goals: Vec<String> = subtasks.iter().map(SubtaskDef::goal).collect();
                let batch = SharedList::from_vec(goals.clone());
                let children: Vec<TaskNode> = goals
                    .into_iter()
                    .map(|goal| node.child(goal, batch.clone()))
                    .collect();
                let count = children.len();
                node.children = children;
                Ok(AgentResult::success(format!("{} subtasks", count)).with_data(json!({ "subtasks": count })))
            }
        }
    }
}

impl Default for ActionRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ActionRunner {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::ActionRunner
    }

    fn description(&self) -> &str {
        "Prompts for the chosen action, parses the reply and applies it"
    }

    async fn execute(
        &self,
        node: &mut TaskNode,
        ctx: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        self.take_action(node, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{
        code_response, context, json_response, missing_module, runtime_error, success, ScriptedLlm,
        ScriptedSandbox,
    };
    use std::sync::Arc;

    const ANALYSIS: &str = "import numpy as np\n\ndef mean_rate(data):\n    \"\"\"\n    Mean firing rate per neuron.\n\n    Input:\n        data (dict): dataset\n    Output:\n        np.ndarray: rates\n    \"\"\"\n    return data['rates'].mean(axis=0)\n\nprint(mean_rate(data).shape)";

    fn node_with(kind: ActionKind, level: usize, max_depth: usize) -> TaskNode {
        let mut node = TaskNode::new(
            level,
            max_depth,
            "Study the dataset.".to_string(),
            SharedList::new(),
            SharedList::new(),
            "MT recording".to_string(),
            "test-model".to_string(),
        );
        node.choose_action(kind).unwrap();
        node
    }

    #[tokio::test]
    async fn brainstorm_adds_ideas_and_summarizes() {
        let llm = Arc::new(ScriptedLlm::new([
            json_response(json!([
                "Neurons deeper on the probe prefer faster motion. Compare speed tuning by depth.",
                "Test videos evoke reliable responses. Measure trial-to-trial correlation."
            ])),
            "I brainstormed two ideas.".to_string(),
        ]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::Brainstorm, 0, 2);

        let result = ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert!(result.success);
        assert_eq!(node.ideas.len(), 2);
        assert_eq!(node.result(), Some("I brainstormed two ideas."));
        let prompts = llm.prompts();
        assert!(prompts[0].starts_with("Your task is to brainstorm ideas related to the following task. Ensure that each idea you come up with is testable: Study the dataset.\n\n"));
        assert!(prompts[0].contains("Dataset Information: MT recording"));
    }

    #[tokio::test]
    async fn unparseable_replies_are_retried_then_abandoned() {
        let attempts = 1 + crate::config::RetryLimits::default().n_take_retries;
        let llm = Arc::new(ScriptedLlm::new(vec!["no json here"; attempts]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::Brainstorm, 0, 2);

        let result = ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert!(!result.success);
        assert_eq!(llm.call_count(), attempts);
        assert!(node.ideas.is_empty());
        assert_eq!(node.result(), None);
    }

    #[tokio::test]
    async fn parse_succeeds_on_a_later_attempt() {
        let llm = Arc::new(ScriptedLlm::new([
            "Sure! Here are ideas: a, b".to_string(),
            json_response(json!(["Only idea. Test it."])),
            "summary".to_string(),
        ]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::Brainstorm, 0, 2);

        assert!(ActionRunner::new().take_action(&mut node, &ctx).await.unwrap().success);
        assert_eq!(node.ideas.snapshot(), vec!["Only idea. Test it.".to_string()]);
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn code_with_missing_module_is_installed_and_recorded() {
        let install = "import subprocess, sys\nsubprocess.check_call([sys.executable, '-m', 'pip', 'install', 'numpy'])";
        let llm = Arc::new(ScriptedLlm::new([
            code_response(ANALYSIS),
            code_response(install),
            "Computed mean rates.".to_string(),
        ]));
        let sandbox = Arc::new(ScriptedSandbox::new([missing_module("numpy"), success(), success()]));
        let (dir, ctx) = context(llm.clone(), sandbox.clone());
        let mut node = node_with(ActionKind::WriteCode, 1, 2);

        let result = ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert!(result.success);
        assert_eq!(result.data.as_ref().unwrap()["debug_steps"], 2);
        assert!(!node.failed);
        assert_eq!(sandbox.executed(), vec![ANALYSIS.to_string(), install.to_string(), ANALYSIS.to_string()]);

        let comments = node.comments.snapshot();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].name, "mean_rate");
        assert!(comments[0].input.starts_with("Input:"));

        let log = std::fs::read_to_string(dir.path().join("logs").join("code_log.py")).unwrap();
        assert!(log.starts_with("\n\n\ndef mean_rate(data):"));
        assert!(log.ends_with("return data['rates'].mean(axis=0)"));
        assert_eq!(node.result(), Some("Computed mean rates."));
    }

    #[tokio::test]
    async fn code_that_never_runs_marks_the_node_failed() {
        let steps = crate::config::RetryLimits::default().n_debug_steps;
        let mut responses = vec![code_response(ANALYSIS)];
        responses.extend(vec![code_response(ANALYSIS); steps]);
        responses.push("It did not work.".to_string());
        let llm = Arc::new(ScriptedLlm::new(responses));
        let sandbox = Arc::new(ScriptedSandbox::new(vec![runtime_error("KeyError: 'rates'"); steps]));
        let (dir, ctx) = context(llm.clone(), sandbox.clone());
        let mut node = node_with(ActionKind::WriteCode, 1, 2);

        let result = ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert!(!result.success);
        assert!(node.failed);
        assert!(node.comments.is_empty());
        assert!(!dir.path().join("logs").join("code_log.py").exists());
        assert_eq!(sandbox.executed().len(), steps);
        assert_eq!(node.result(), Some("It did not work."));
        assert_eq!(llm.remaining(), 0);
    }

    #[tokio::test]
    async fn code_prompt_includes_known_functions_but_not_ideas() {
        let llm = Arc::new(ScriptedLlm::new([code_response("print(1)"), "done".to_string()]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::WriteCode, 1, 2);
        node.ideas.push("secret idea".to_string());
        node.comments.extend(parse_function_comments(ANALYSIS));

        ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("feel free to use them:\nmean_rate\nMean firing rate per neuron."));
        assert!(!prompt.contains("secret idea"));
    }

    #[tokio::test]
    async fn divide_creates_children_sharing_one_goal_list() {
        let llm = Arc::new(ScriptedLlm::new([
            json_response(json!([
                {"summary": "Filter neurons", "description": "Keep units above 1 Hz."},
                {"summary": "Fit tuning", "description": "Fit direction tuning curves."},
                {"summary": "Map columns", "description": "Relate preference to depth."}
            ])),
            "Divided into three subtasks.".to_string(),
        ]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::Divide, 0, 2);
        node.ideas.push("parent idea".to_string());

        ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert_eq!(node.children.len(), 3);
        let first = &node.children[0];
        assert_eq!(first.goal, "Filter neurons. Keep units above 1 Hz.");
        for child in &node.children {
            assert_eq!(child.level, 1);
            assert!(child.ideas.ptr_eq(&first.ideas));
            assert!(child.comments.ptr_eq(&node.comments));
            assert!(!child.ideas.ptr_eq(&node.ideas));
            assert!(child.actions().contains(ActionKind::Divide));
        }
        assert_eq!(
            first.ideas.snapshot(),
            vec![
                "Filter neurons. Keep units above 1 Hz.".to_string(),
                "Fit tuning. Fit direction tuning curves.".to_string(),
                "Map columns. Relate preference to depth.".to_string(),
            ]
        );

        node.children[2].ideas.push("late idea".to_string());
        assert_eq!(node.children[0].ideas.len(), 4);
        assert_eq!(node.ideas.len(), 1);
    }

    #[tokio::test]
    async fn children_at_max_depth_cannot_divide() {
        let llm = Arc::new(ScriptedLlm::new([
            json_response(json!([{"summary": "a", "description": "b"}])),
            "ok".to_string(),
        ]));
        let (_dir, ctx) = context(llm.clone(), Arc::new(ScriptedSandbox::default()));
        let mut node = node_with(ActionKind::Divide, 1, 2);

        ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();
        assert!(!node.children[0].actions().contains(ActionKind::Divide));
    }

    #[tokio::test]
    async fn reflections_revise_in_conversation() {
        let llm = Arc::new(ScriptedLlm::new([
            json_response(json!(["first draft"])),
            json_response(json!(["revised idea. Test it."])),
            "summary".to_string(),
        ]));
        let sandbox = Arc::new(ScriptedSandbox::default());
        let (_dir, mut ctx) = context(llm.clone(), sandbox);
        ctx.config.limits.n_reflections = 1;
        let mut node = node_with(ActionKind::Brainstorm, 0, 2);

        ActionRunner::new().take_action(&mut node, &ctx).await.unwrap();

        assert_eq!(node.ideas.snapshot(), vec!["revised idea. Test it.".to_string()]);
        let revision = &llm.conversations()[1];
        assert_eq!(revision.len(), 3);
        assert!(revision[1].content.contains("first draft"));
        assert!(revision[2].content.starts_with("Please reflect on and revise"));
    }
}
