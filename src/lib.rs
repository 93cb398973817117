//! # research-tree
//!
//! Recursive research-task orchestrator. A language model explores a
//! dataset by brainstorming hypotheses, writing and repairing analysis code
//! in a persistent Python interpreter, and dividing tasks into subtasks.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │            RootAgent             │
//!        │  (brainstorm, divide, traverse)  │
//!        └────────────────┬─────────────────┘
//!                         │ depth-first, serial
//!                         ▼
//!                ┌─────────────────┐
//!                │    NodeAgent    │
//!                │ select → take   │
//!                └───────┬─────────┘
//!                        │
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!      LlmClient   PythonSandbox   HistoryComposer
//! ```
//!
//! ## Modules
//! - `agents`: root/node orchestration, selection, actions, repair loop
//! - `task`: tree nodes, the action catalog and prompt text
//! - `parse`: extraction of JSON, code and selections from model replies
//! - `sandbox`: the shared Python namespace
//! - `history`: prompt context from ideas, functions and past results
//! - `store`: code log and tree snapshot
//! - `llm`: OpenAI-compatible chat client

pub mod agents;
pub mod config;
pub mod history;
pub mod llm;
pub mod parse;
pub mod sandbox;
pub mod store;
pub mod task;
pub mod util;

pub use config::Config;
