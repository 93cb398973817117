//! The action catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::prompts;
use crate::history::HistoryScope;

/// The three things a node can do.
///
/// Serialized under the same names the model sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Brainstorm,
    #[serde(rename = "Write code")]
    WriteCode,
    #[serde(rename = "Divide task into smaller subtasks")]
    Divide,
}

impl ActionKind {
    /// Name shown to the model in the selection prompt.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Brainstorm => "Brainstorm",
            ActionKind::WriteCode => "Write code",
            ActionKind::Divide => "Divide task into smaller subtasks",
        }
    }

    /// History categories included when taking this action.
    pub fn history_scope(self) -> HistoryScope {
        match self {
            ActionKind::Brainstorm => HistoryScope::BRAINSTORM,
            ActionKind::WriteCode => HistoryScope::CODE,
            ActionKind::Divide => HistoryScope::DIVIDE,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Repair prompt builders attached to the code action.
#[derive(Clone, Copy)]
pub struct DebugPrompts {
    /// `(error detail, failing code) -> prompt`
    pub default_error: fn(&str, &str) -> String,
    /// `(error detail) -> prompt asking for an install snippet`
    pub module_error: fn(&str) -> String,
}

impl fmt::Debug for DebugPrompts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugPrompts").finish_non_exhaustive()
    }
}

/// Prompt text for one action.
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    pub kind: ActionKind,
    pub selection_hint: String,
    pub prompt_start: String,
    pub prompt_end: String,
    pub revise_prompt: Option<String>,
    pub debug: Option<DebugPrompts>,
}

impl ActionDefinition {
    pub fn brainstorm() -> Self {
        Self {
            kind: ActionKind::Brainstorm,
            selection_hint: prompts::BRAINSTORM_HINT.to_string(),
            prompt_start: prompts::BRAINSTORM_START.to_string(),
            prompt_end: prompts::BRAINSTORM_END.to_string(),
            revise_prompt: Some(prompts::BRAINSTORM_REVISE.to_string()),
            debug: None,
        }
    }

    pub fn write_code() -> Self {
        Self {
            kind: ActionKind::WriteCode,
            selection_hint: prompts::CODE_HINT.to_string(),
            prompt_start: prompts::CODE_START.to_string(),
            prompt_end: prompts::code_end(),
            revise_prompt: Some(prompts::code_revise()),
            debug: Some(DebugPrompts {
                default_error: prompts::default_error,
                module_error: prompts::module_error,
            }),
        }
    }

    pub fn divide() -> Self {
        Self {
            kind: ActionKind::Divide,
            selection_hint: prompts::DIVIDE_HINT.to_string(),
            prompt_start: prompts::DIVIDE_START.to_string(),
            prompt_end: prompts::divide_end(),
            revise_prompt: Some(prompts::divide_revise()),
            debug: None,
        }
    }
}

/// Ordered set of actions available to one node.
///
/// The order is the numbering the model sees when selecting.
#[derive(Debug, Clone)]
pub struct ActionSet {
    actions: Vec<ActionDefinition>,
}

impl ActionSet {
    /// Brainstorm, write code, divide.
    pub fn full() -> Self {
        Self {
            actions: vec![
                ActionDefinition::brainstorm(),
                ActionDefinition::write_code(),
                ActionDefinition::divide(),
            ],
        }
    }

    /// Catalog for a node at `level`; divide is withheld at or past `max_depth`.
    pub fn for_level(level: usize, max_depth: usize) -> Self {
        let mut set = Self::full();
        if level >= max_depth {
            set.actions.retain(|a| a.kind != ActionKind::Divide);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter()
    }

    pub fn first(&self) -> Option<&ActionDefinition> {
        self.actions.first()
    }

    /// 1-indexed lookup, matching the numbering in the selection prompt.
    pub fn get_numbered(&self, number: usize) -> Option<&ActionDefinition> {
        number.checked_sub(1).and_then(|i| self.actions.get(i))
    }

    pub fn get(&self, kind: ActionKind) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.kind == kind)
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|a| a.kind).collect()
    }
}
