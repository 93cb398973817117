//! Task module - the research tree's nodes and the action catalog.
//!
//! Nodes own their children by value; the tree is acyclic and is never
//! pruned during a run. Idea and comment lists are the only state shared
//! between nodes, through [`SharedList`] handles.

mod action;
mod node;
pub mod prompts;
mod shared;

pub use action::{ActionDefinition, ActionKind, ActionSet, DebugPrompts};
pub use node::{TaskError, TaskId, TaskNode};
pub use shared::SharedList;
