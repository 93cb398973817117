//! Leaf agents - the steps a node goes through.
//!
//! - `ActionSelector`: asks the model which action to take
//! - `ActionRunner`: prompts for the action, parses and applies the reply
//! - `CodeDebugger`: execute-and-repair loop used by the code action
//! - `Summarizer`: records what the node accomplished

mod debugger;
mod runner;
mod selector;
mod summarizer;

pub use debugger::{CodeDebugger, RepairOutcome};
pub use runner::{ActionRunner, ParsedAction};
pub use selector::ActionSelector;
pub use summarizer::Summarizer;
