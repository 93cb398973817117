//! Orchestrator agents - Root and Node agents that walk the tree.

mod node;
mod root;

pub use node::NodeAgent;
pub use root::{RootAgent, RunReport};
