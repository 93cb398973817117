//! Task nodes of the research tree.
//!
//! # Invariants
//! - `chosen_action`, when set, is one of `actions`
//! - `actions` never offers divide when `level >= max_depth`
//! - `children` stays empty until a divide action runs on this node
//! - `result` is written at most once

use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::action::{ActionDefinition, ActionKind, ActionSet};
use super::shared::SharedList;
use crate::parse::FunctionSummary;

/// Unique identifier for a task node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of work in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub level: usize,
    pub max_depth: usize,
    pub goal: String,
    #[serde(rename = "available_actions", serialize_with = "serialize_action_kinds")]
    actions: ActionSet,
    chosen_action: Option<ActionKind>,
    /// Shared with siblings created by the same divide
    pub ideas: SharedList<String>,
    /// Shared by every node in the run
    #[serde(skip)]
    pub comments: SharedList<FunctionSummary>,
    #[serde(skip)]
    pub dataset_info: String,
    pub model: String,
    pub failed: bool,
    result: Option<String>,
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    /// Level-0 node with fresh idea and comment lists.
    pub fn root(
        goal: impl Into<String>,
        dataset_info: impl Into<String>,
        model: impl Into<String>,
        max_depth: usize,
    ) -> Self {
        Self::new(
            0,
            max_depth,
            goal.into(),
            SharedList::new(),
            SharedList::new(),
            dataset_info.into(),
            model.into(),
        )
    }

    pub fn new(
        level: usize,
        max_depth: usize,
        goal: String,
        ideas: SharedList<String>,
        comments: SharedList<FunctionSummary>,
        dataset_info: String,
        model: String,
    ) -> Self {
        Self {
            id: TaskId::new(),
            level,
            max_depth,
            goal,
            actions: ActionSet::for_level(level, max_depth),
            chosen_action: None,
            ideas,
            comments,
            dataset_info,
            model,
            failed: false,
            result: None,
            children: Vec::new(),
        }
    }

    /// Node one level down that inherits this node's run-wide context.
    pub fn child(&self, goal: String, ideas: SharedList<String>) -> Self {
        Self::new(
            self.level + 1,
            self.max_depth,
            goal,
            ideas,
            self.comments.clone(),
            self.dataset_info.clone(),
            self.model.clone(),
        )
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn chosen_action(&self) -> Option<ActionKind> {
        self.chosen_action
    }

    /// Definition of the chosen action.
    pub fn chosen_definition(&self) -> Option<&ActionDefinition> {
        self.chosen_action.and_then(|kind| self.actions.get(kind))
    }

    /// Record the action this node will take.
    ///
    /// # Errors
    /// `TaskError::ActionUnavailable` if `kind` is not offered at this level.
    pub fn choose_action(&mut self, kind: ActionKind) -> Result<(), TaskError> {
        if !self.actions.contains(kind) {
            return Err(TaskError::ActionUnavailable {
                action: kind,
                level: self.level,
            });
        }
        self.chosen_action = Some(kind);
        Ok(())
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Store the summary unless one is already present.
    ///
    /// Returns whether the value was stored.
    pub fn set_result(&mut self, result: String) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        true
    }

    /// Number of nodes in this subtree, this one included.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(TaskNode::subtree_size).sum::<usize>()
    }
}

fn serialize_action_kinds<S: Serializer>(actions: &ActionSet, serializer: S) -> Result<S::Ok, S::Error> {
    actions.kinds().serialize(serializer)
}

/// Errors from task-node operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("Action '{action}' is not available at level {level}")]
    ActionUnavailable { action: ActionKind, level: usize },
}
