//! Code repair loop - runs generated code and asks the model to fix failures.

use serde::Serialize;

use crate::agents::{AgentContext, AgentError};
use crate::parse::parse_code;
use crate::sandbox::{ExecFailure, ExecOutcome};
use crate::task::DebugPrompts;
use crate::util::preview;

/// Where the repair loop ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    /// The code as last executed (or last proposed)
    pub code: String,
    pub success: bool,
    /// Loop iterations used, the successful run included
    pub debug_steps: usize,
}

/// Execute-then-repair loop bounded by `n_debug_steps`.
///
/// Each iteration executes the current code once. On a missing module the
/// model is asked for an install snippet, which runs in the same namespace;
/// the analysis code is kept as is and retried next iteration. On any other
/// failure the model's fix replaces the code, unless the reply holds no code
/// block, in which case the previous code is kept. Proposed code is never
/// executed outside the loop.
#[derive(Debug, Default)]
pub struct CodeDebugger;

impl CodeDebugger {
    pub fn new() -> Self {
        Self
    }

    pub async fn repair(
        &self,
        code: String,
        prompts: &DebugPrompts,
        model: &str,
        ctx: &AgentContext,
    ) -> Result<RepairOutcome, AgentError> {
        let max_steps = ctx.limits().n_debug_steps;
        let mut code = code;
        let mut success = false;
        let mut debug_steps = 0;

        while debug_steps < max_steps && !success {
            match ctx.execute_code(&code).await? {
                ExecOutcome::Success { stdout } => {
                    success = true;
                    if !stdout.is_empty() {
                        tracing::debug!("Code output:\n{}", preview(&stdout, 2000));
                    }
                }
                ExecOutcome::Failure(ExecFailure::DependencyMissing { module, detail }) => {
                    tracing::info!("Missing module '{}', asking for an install snippet", module);
                    let response = ctx.chat(model, &(prompts.module_error)(&detail)).await?;
                    match parse_code(&response) {
                        Some(snippet) => {
                            if let ExecOutcome::Failure(failure) = ctx.execute_code(&snippet).await? {
                                tracing::warn!(
                                    "Install snippet failed: {}",
                                    preview(failure.detail(), 500)
                                );
                            }
                        }
                        None => tracing::warn!("Install reply held no code block"),
                    }
                }
                ExecOutcome::Failure(ExecFailure::Runtime { detail }) => {
                    tracing::info!(
                        "Code failed (step {}/{}): {}",
                        debug_steps + 1,
                        max_steps,
                        preview(last_line(&detail), 300)
                    );
                    let response = ctx
                        .chat(model, &(prompts.default_error)(&detail, &code))
                        .await?;
                    match parse_code(&response) {
                        Some(fixed) => code = fixed,
                        None => tracing::warn!("Repair reply held no code block; keeping previous code"),
                    }
                }
            }
            debug_steps += 1;
        }

        if !success {
            tracing::warn!("Code still failing after {} repair steps", debug_steps);
        }

        Ok(RepairOutcome {
            code,
            success,
            debug_steps,
        })
    }
}

/// The exception line of a traceback.
fn last_line(detail: &str) -> &str {
    detail
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or(detail)
}
