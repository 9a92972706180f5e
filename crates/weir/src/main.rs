//! Weir - stream-processing engine
//!
//! # Usage
//!
//! ```bash
//! # Run one pipeline to completion
//! weir --pipelineConfig pipeline.json
//!
//! # Run the control API server
//! weir --apiServer --apiConfig api.json
//!
//! # Verify a rule plugin satisfies the rule contract
//! weir --checkRule rules/my_rule.wasm
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weir_api::ApiServerConfig;
use weir_control::{BackendConfig, PipelineManager};
use weir_rules::RuleRegistry;

/// Weir - a configurable stream-processing engine
#[derive(Parser, Debug)]
#[command(name = "weir")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["pipeline_config", "api_server", "check_rule"])
))]
struct Cli {
    /// Run one pipeline to completion from a config file
    #[arg(long = "pipelineConfig", value_name = "FILE")]
    pipeline_config: Option<PathBuf>,

    /// Run the control API server
    #[arg(long = "apiServer")]
    api_server: bool,

    /// API server configuration file
    #[arg(long = "apiConfig", value_name = "FILE", requires = "api_server")]
    api_config: Option<PathBuf>,

    /// Load a rule plugin and verify it satisfies the rule contract
    #[arg(long = "checkRule", value_name = "FILE")]
    check_rule: Option<PathBuf>,

    /// Raise log verbosity to debug
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.debug { "debug" } else { "info" })?;

    if let Some(config) = cli.pipeline_config.as_deref() {
        run_pipeline(config).await
    } else if cli.api_server {
        let api_config = cli
            .api_config
            .as_deref()
            .context("--apiServer requires --apiConfig")?;
        run_api(api_config).await
    } else if let Some(plugin) = cli.check_rule.as_deref() {
        check_rule(plugin)
    } else {
        unreachable!("clap enforces exactly one mode")
    }
}

/// Run a single pipeline against the implicit embedded backend
async fn run_pipeline(config_path: &Path) -> Result<()> {
    let backend = BackendConfig::default_sled().create()?;
    let manager = PipelineManager::new(backend);
    manager.init().await.context("failed to open backend")?;

    let raw = std::fs::read(config_path)
        .with_context(|| format!("failed to open config file {}", config_path.display()))?;
    let pipeline = manager.new_pipeline(&raw).await?;

    // Blocks until an interrupt or terminate signal, then shuts down.
    pipeline.run().await?;
    Ok(())
}

/// Run the control API server
async fn run_api(config_path: &Path) -> Result<()> {
    let raw = std::fs::read(config_path)
        .with_context(|| format!("failed to open API config {}", config_path.display()))?;
    let config = ApiServerConfig::from_slice(&raw).context("invalid API config")?;

    let backend = config.backend.create()?;
    let manager = Arc::new(PipelineManager::new(backend));
    manager.init().await.context("failed to open backend")?;

    weir_api::serve(config, manager).await?;
    Ok(())
}

/// Verify that a rule plugin resolves and satisfies the rule contract
fn check_rule(plugin: &Path) -> Result<()> {
    RuleRegistry::with_builtins()
        .check(plugin)
        .with_context(|| format!("rule check failed for {}", plugin.display()))?;
    println!("{}: rule OK", plugin.display());
    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exactly_one_mode_required() {
        assert!(Cli::try_parse_from(["weir"]).is_err());
        assert!(Cli::try_parse_from(["weir", "--pipelineConfig", "p.json", "--apiServer"]).is_err());
        assert!(Cli::try_parse_from(["weir", "--pipelineConfig", "p.json"]).is_ok());
        assert!(Cli::try_parse_from(["weir", "--apiServer", "--apiConfig", "a.json"]).is_ok());
        assert!(Cli::try_parse_from(["weir", "--checkRule", "r.wasm", "--debug"]).is_ok());
    }

    #[test]
    fn test_api_config_requires_api_server() {
        assert!(Cli::try_parse_from(["weir", "--apiConfig", "a.json"]).is_err());
    }
}
