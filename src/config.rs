//! Configuration management for research-tree.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required unless `LLM_BASE_URL` points at a local server.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to OpenRouter.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `deepseek/deepseek-r1`.
//! - `LLM_MAX_RETRIES` - Optional. Retries for transient HTTP failures. Defaults to `3`.
//! - `RESEARCH_GOAL` - Optional. Goal given to the root task node.
//! - `MAX_DEPTH` - Optional. Maximum decomposition depth. Defaults to `2`.
//! - `N_SELECT_RETRIES` - Optional. Action selection retries. Defaults to `5`.
//! - `N_TAKE_RETRIES` - Optional. Take-action retries. Defaults to `10`.
//! - `N_DEBUG_STEPS` - Optional. Code repair iterations. Defaults to `10`.
//! - `N_REFLECTIONS` - Optional. Revision rounds per action. Defaults to `0`.
//! - `WORKSPACE_PATH` - Optional. Interpreter working directory. Defaults to current directory.
//! - `LOG_DIR` - Optional. Run logs and snapshots. Defaults to `<workspace>/logs`.
//! - `RESULTS_FILE` - Optional. Results history file. Defaults to `<workspace>/results.txt`.
//! - `PYTHON_COMMAND` - Optional. Interpreter command line. Defaults to `python3`.
//! - `DATASET_PATH` - Optional. Pickled dataset. Defaults to `<workspace>/dataset/data.pkl`.
//! - `DATASET_INFO_FILE` - Optional. Replaces the built-in dataset description.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Goal handed to the root node when `RESEARCH_GOAL` is unset.
pub const DEFAULT_GOAL: &str =
    "Your overall goal is to make novel scientific discoveries about a dataset you are provided with.";

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Bounded-retry ceilings for the task machinery.
///
/// These are fail-safe ceilings, not adaptive backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    /// Extra selection attempts after the first one
    pub n_select_retries: usize,
    /// Extra take-action attempts after the first one
    pub n_take_retries: usize,
    /// Iterations of the code repair loop
    pub n_debug_steps: usize,
    /// Revision rounds applied to each take-action response
    pub n_reflections: usize,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            n_select_retries: 5,
            n_take_retries: 10,
            n_debug_steps: 10,
            n_reflections: 0,
        }
    }
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the model endpoint (empty for local servers)
    pub api_key: String,

    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Model identifier
    pub default_model: String,

    /// Retries for transient HTTP failures
    pub llm_max_retries: u32,

    /// Goal of the root task node
    pub goal: String,

    /// Maximum decomposition depth
    pub max_depth: usize,

    pub limits: RetryLimits,

    /// Working directory of the interpreter; generated code writes under it
    pub workspace_path: PathBuf,

    pub log_dir: PathBuf,

    pub results_file: PathBuf,

    pub python_command: String,

    pub dataset_path: PathBuf,

    pub dataset_info_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set and
    /// no `LLM_BASE_URL` override is given, or `ConfigError::InvalidValue` for
    /// unparseable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("LLM_BASE_URL").ok();
        let api_key = match std::env::var("OPENROUTER_API_KEY") {
            Ok(key) => key,
            Err(_) if base_url.is_some() => String::new(),
            Err(_) => return Err(ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string())),
        };

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let mut config = Self::new(
            api_key,
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "deepseek/deepseek-r1".to_string()),
            workspace_path,
        );

        if let Some(url) = base_url {
            config.base_url = url;
        }
        if let Ok(goal) = std::env::var("RESEARCH_GOAL") {
            config.goal = goal;
        }
        config.llm_max_retries = env_parse("LLM_MAX_RETRIES", config.llm_max_retries)?;
        config.max_depth = env_parse("MAX_DEPTH", config.max_depth)?;
        config.limits = RetryLimits {
            n_select_retries: env_parse("N_SELECT_RETRIES", config.limits.n_select_retries)?,
            n_take_retries: env_parse("N_TAKE_RETRIES", config.limits.n_take_retries)?,
            n_debug_steps: env_parse("N_DEBUG_STEPS", config.limits.n_debug_steps)?,
            n_reflections: env_parse("N_REFLECTIONS", config.limits.n_reflections)?,
        };

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("RESULTS_FILE") {
            config.results_file = PathBuf::from(path);
        }
        if let Ok(cmd) = std::env::var("PYTHON_COMMAND") {
            config.python_command = cmd;
        }
        if let Ok(path) = std::env::var("DATASET_PATH") {
            config.dataset_path = PathBuf::from(path);
        }
        config.dataset_info_file = std::env::var("DATASET_INFO_FILE").ok().map(PathBuf::from);

        Ok(config)
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            llm_max_retries: 3,
            goal: DEFAULT_GOAL.to_string(),
            max_depth: 2,
            limits: RetryLimits::default(),
            log_dir: workspace_path.join("logs"),
            results_file: workspace_path.join("results.txt"),
            python_command: "python3".to_string(),
            dataset_path: workspace_path.join("dataset").join("data.pkl"),
            dataset_info_file: None,
            workspace_path,
        }
    }

    /// Directory generated code is told to save plots and statistics into.
    pub fn outputs_dir(&self) -> PathBuf {
        self.workspace_path.join("outputs")
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_documented_defaults() {
        let config = Config::new(
            "key".to_string(),
            "some/model".to_string(),
            PathBuf::from("/tmp/ws"),
        );
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.limits, RetryLimits::default());
        assert_eq!(config.limits.n_select_retries, 5);
        assert_eq!(config.limits.n_take_retries, 10);
        assert_eq!(config.limits.n_debug_steps, 10);
        assert_eq!(config.limits.n_reflections, 0);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/ws/logs"));
        assert_eq!(config.results_file, PathBuf::from("/tmp/ws/results.txt"));
        assert_eq!(config.outputs_dir(), PathBuf::from("/tmp/ws/outputs"));
        assert_eq!(config.goal, DEFAULT_GOAL);
    }

    #[test]
    fn env_parse_reports_the_variable_name() {
        std::env::set_var("RESEARCH_TREE_TEST_BAD_NUMBER", "many");
        let err = env_parse::<usize>("RESEARCH_TREE_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("RESEARCH_TREE_TEST_BAD_NUMBER"));
        std::env::remove_var("RESEARCH_TREE_TEST_BAD_NUMBER");
    }

    #[test]
    fn env_parse_falls_back_when_unset() {
        assert_eq!(env_parse::<usize>("RESEARCH_TREE_TEST_UNSET_VALUE", 7).unwrap(), 7);
    }
}
