//! Persistent Python interpreter speaking a JSON-lines protocol.
//!
//! The runner keeps one global namespace for the life of the process. Each
//! request is `{"code": ...}`; each reply reports success with captured
//! stdout, or the exception type, missing module name and traceback.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{CodeSandbox, DatasetProfile, ExecFailure, ExecOutcome, SandboxError};
use crate::config::Config;

/// The protocol goes over a private duplicate of fd 1; fd 1 itself is pointed
/// at stderr so output from child processes (pip, shell calls) cannot
/// interleave with replies.
const RUNNER: &str = r#"
import contextlib
import io
import json
import os
import sys
import traceback

_PROTOCOL = os.fdopen(os.dup(1), "w", encoding="utf-8")
os.dup2(2, 1)
sys.stdout = sys.stderr


def _reply(obj):
    _PROTOCOL.write(json.dumps(obj, ensure_ascii=False) + "\n")
    _PROTOCOL.flush()


_namespace = {"__name__": "research_namespace"}

for line in sys.stdin:
    if not line.strip():
        continue
    request = json.loads(line)
    buffer = io.StringIO()
    try:
        with contextlib.redirect_stdout(buffer):
            exec(compile(request.get("code", ""), "<generated>", "exec"), _namespace)
        _reply({"ok": True, "stdout": buffer.getvalue()})
    except BaseException as e:
        module = getattr(e, "name", None) if isinstance(e, ModuleNotFoundError) else None
        _reply({
            "ok": False,
            "stdout": buffer.getvalue(),
            "error_type": type(e).__name__,
            "module": module,
            "traceback": traceback.format_exc(),
        })
"#;

#[derive(Debug, Deserialize)]
struct ExecReply {
    ok: bool,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    traceback: String,
}

impl ExecReply {
    fn into_outcome(self) -> ExecOutcome {
        if self.ok {
            ExecOutcome::Success {
                stdout: self.stdout,
            }
        } else {
            ExecOutcome::Failure(ExecFailure::from_exception(
                &self.error_type,
                self.module,
                self.traceback,
            ))
        }
    }
}

#[derive(Debug)]
struct PythonRepl {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PythonRepl {
    async fn spawn(command_line: &str, workspace: &Path) -> Result<Self, SandboxError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().unwrap_or("python3");

        let mut command = Command::new(program);
        command
            .args(parts)
            .arg("-u")
            .arg("-c")
            .arg(RUNNER)
            .current_dir(workspace)
            .env("MPLBACKEND", "Agg")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| SandboxError::Spawn {
            command: command_line.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SandboxError::Protocol("failed to capture interpreter stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SandboxError::Protocol("failed to capture interpreter stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "research_tree::sandbox::stderr", "{}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn exec(&mut self, code: &str) -> Result<ExecOutcome, SandboxError> {
        let mut request = serde_json::to_vec(&json!({ "code": code }))
            .map_err(|e| SandboxError::Protocol(e.to_string()))?;
        request.push(b'\n');
        self.stdin.write_all(&request).await?;
        self.stdin.flush().await?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line).await? == 0 {
            return Err(SandboxError::Exited);
        }
        let reply: ExecReply = serde_json::from_str(line.trim()).map_err(|e| {
            SandboxError::Protocol(format!("{}; raw={}", e, line.trim()))
        })?;
        Ok(reply.into_outcome())
    }

    async fn shutdown(&mut self) {
        let _ = self.stdin.shutdown().await;
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

/// The run's single execution context.
///
/// If the interpreter process dies, the next execution reports a `Runtime`
/// failure and a fresh, re-bootstrapped interpreter takes its place.
/// Definitions made before the crash are lost.
pub struct PythonSandbox {
    python_command: String,
    workspace: PathBuf,
    bootstrap_code: String,
    repl: Mutex<Option<PythonRepl>>,
}

impl PythonSandbox {
    /// Start the interpreter and run the dataset bootstrap.
    ///
    /// # Errors
    ///
    /// Fails if the interpreter cannot be spawned or the bootstrap raises.
    pub async fn start(config: &Config, profile: &DatasetProfile) -> Result<Self, SandboxError> {
        Self::with_bootstrap(
            &config.python_command,
            config.workspace_path.clone(),
            profile.bootstrap_code.clone(),
        )
        .await
    }

    pub async fn with_bootstrap(
        python_command: &str,
        workspace: PathBuf,
        bootstrap_code: String,
    ) -> Result<Self, SandboxError> {
        let sandbox = Self {
            python_command: python_command.to_string(),
            workspace,
            bootstrap_code,
            repl: Mutex::new(None),
        };
        let repl = sandbox.fresh_repl().await?;
        *sandbox.repl.lock().await = Some(repl);
        tracing::info!("Python sandbox ready (cwd {})", sandbox.workspace.display());
        Ok(sandbox)
    }

    async fn fresh_repl(&self) -> Result<PythonRepl, SandboxError> {
        let mut repl = PythonRepl::spawn(&self.python_command, &self.workspace).await?;
        if self.bootstrap_code.trim().is_empty() {
            return Ok(repl);
        }
        match repl.exec(&self.bootstrap_code).await? {
            ExecOutcome::Success { .. } => Ok(repl),
            ExecOutcome::Failure(failure) => {
                repl.shutdown().await;
                Err(SandboxError::Bootstrap(failure.detail().to_string()))
            }
        }
    }

    async fn execute_inner(&self, code: &str) -> Result<ExecOutcome, SandboxError> {
        let mut guard = self.repl.lock().await;
        if guard.is_none() {
            *guard = Some(self.fresh_repl().await?);
        }
        let Some(repl) = guard.as_mut() else {
            return Err(SandboxError::Exited);
        };

        match repl.exec(code).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ (SandboxError::Exited | SandboxError::Io(_))) => {
                tracing::warn!("Python interpreter lost ({}); restarting", e);
                repl.shutdown().await;
                *guard = Some(self.fresh_repl().await?);
                Ok(ExecOutcome::Failure(ExecFailure::Runtime {
                    detail: format!(
                        "The Python interpreter exited while running this code ({}). \
                         Variables defined by earlier code were lost; `data` has been reloaded.",
                        e
                    ),
                }))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CodeSandbox for PythonSandbox {
    async fn execute(&self, code: &str) -> anyhow::Result<ExecOutcome> {
        Ok(self.execute_inner(code).await?)
    }
}
