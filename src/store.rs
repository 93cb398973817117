//! Run artifacts: the code log and the final tree snapshot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::parse::{FunctionSource, FunctionSummary};
use crate::task::TaskNode;

const CODE_LOG: &str = "code_log.py";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Everything a run produced, as saved at the end.
#[derive(Debug, Serialize)]
pub struct RunSnapshot<'a> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub goal: &'a str,
    pub model: &'a str,
    pub dataset_info: &'a str,
    pub functions: Vec<FunctionSummary>,
    pub tree: &'a TaskNode,
}

/// Writes run artifacts under the log directory.
#[derive(Debug, Clone)]
pub struct RunStore {
    log_dir: PathBuf,
}

impl RunStore {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn code_log_path(&self) -> PathBuf {
        self.log_dir.join(CODE_LOG)
    }

    /// Append function sources to the code log, each preceded by three newlines.
    pub async fn append_functions(&self, functions: &[FunctionSource]) -> Result<(), StoreError> {
        if functions.is_empty() {
            return Ok(());
        }
        let path = self.code_log_path();
        fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|e| StoreError::io(&self.log_dir, e))?;

        let mut text = String::new();
        for function in functions {
            text.push_str("\n\n\n");
            text.push_str(&function.source);
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!("Archived {} function(s) to {}", functions.len(), path.display());
        Ok(())
    }

    /// Write `task_state_<timestamp>.json` and return its path.
    pub async fn save_snapshot(&self, snapshot: &RunSnapshot<'_>) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|e| StoreError::io(&self.log_dir, e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.log_dir.join(format!("task_state_{}.json", timestamp));
        let data = serde_json::to_vec_pretty(snapshot)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, data)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        tracing::info!("Saved task state to {}", path.display());
        Ok(path)
    }
}
