//! Execution sandbox for generated analysis code.
//!
//! Every execution in a run shares one Python namespace: functions and
//! variables defined by one node's code stay visible to every later node.
//! Failures are classified once, here, from the interpreter's structured
//! report; callers never inspect traceback text to decide what went wrong.

mod dataset;
mod python;

pub use dataset::{DatasetProfile, NEUROPIXEL_MT_DESCRIPTION};
pub use python::PythonSandbox;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of running one code string in the shared namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecOutcome {
    /// Ran to completion; captured standard output
    Success { stdout: String },
    Failure(ExecFailure),
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Success { .. })
    }
}

/// Why an execution raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecFailure {
    /// An import failed because the module is not installed
    DependencyMissing { module: String, detail: String },
    /// Any other raised exception
    Runtime { detail: String },
}

impl ExecFailure {
    /// Classify an exception reported by the interpreter.
    pub fn from_exception(error_type: &str, module: Option<String>, detail: String) -> Self {
        if error_type == "ModuleNotFoundError" {
            ExecFailure::DependencyMissing {
                module: module.unwrap_or_default(),
                detail,
            }
        } else {
            ExecFailure::Runtime { detail }
        }
    }

    /// Formatted traceback used in repair prompts.
    pub fn detail(&self) -> &str {
        match self {
            ExecFailure::DependencyMissing { detail, .. } | ExecFailure::Runtime { detail } => {
                detail
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to spawn interpreter `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interpreter I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message from interpreter: {0}")]
    Protocol(String),

    #[error("interpreter exited unexpectedly")]
    Exited,

    #[error("dataset bootstrap failed: {0}")]
    Bootstrap(String),
}

/// A persistent execution context for generated code.
///
/// `Err` is reserved for infrastructure faults; code that raises is an
/// `Ok(ExecOutcome::Failure)`.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    async fn execute(&self, code: &str) -> anyhow::Result<ExecOutcome>;
}
