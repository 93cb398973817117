//! research-tree - command-line entry point.
//!
//! Loads configuration from the environment, starts the Python sandbox and
//! runs one research tree to completion.

use std::sync::Arc;

use research_tree::agents::{AgentContext, RootAgent};
use research_tree::config::Config;
use research_tree::llm::{OpenRouterClient, RetryConfig};
use research_tree::sandbox::{DatasetProfile, PythonSandbox};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RUN_LOG: &str = "recurse_log.txt";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.log_dir)?;
    std::fs::create_dir_all(config.outputs_dir())?;
    let log_file = std::fs::File::create(config.log_dir.join(RUN_LOG))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_tree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    info!(
        "Loaded configuration: model={}, max_depth={}, workspace={}",
        config.default_model,
        config.max_depth,
        config.workspace_path.display()
    );

    let profile = DatasetProfile::from_config(&config)?;
    let llm = Arc::new(OpenRouterClient::with_retry_config(
        config.api_key.clone(),
        &config.base_url,
        RetryConfig::with_max_retries(config.llm_max_retries),
    ));
    let sandbox = Arc::new(PythonSandbox::start(&config, &profile).await?);

    let ctx = AgentContext::new(config, llm, sandbox);
    let report = RootAgent::new().run(&profile.description, &ctx).await?;

    info!(
        "Run finished: {} (snapshot at {})",
        report.result.output,
        report.snapshot_path.display()
    );
    Ok(())
}
