//! relaychat - talk to a function-calling model that can use a tool server
//!
//! Subcommands:
//! - `relaychat chat` - interactive loop (default)
//! - `relaychat ask <message>` - answer one message and exit
//! - `relaychat tools` - list the tools offered to the model
//! - `relaychat config` - show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use relayconf::{ConfigSources, RelayConfig};
use toolrelay::Orchestrator;
use tracing_subscriber::EnvFilter;

mod chat;
mod commands;

#[derive(Parser)]
#[command(name = "relaychat")]
#[command(about = "Chat with a model that can call tools on a stdio tool server")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings that win over config files and environment.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Config file to use instead of ./toolrelay.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model generate-content endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Tool server executable
    #[arg(long, global = true)]
    tool_command: Option<PathBuf>,

    /// Skip TLS certificate verification for the model endpoint
    #[arg(long, global = true)]
    insecure: bool,
}

impl Overrides {
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.model.endpoint = endpoint.clone();
        }
        if let Some(command) = &self.tool_command {
            config.tools.command = command.clone();
        }
        if self.insecure {
            config.model.insecure_skip_verify = true;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Answer a single message and exit
    Ask {
        /// The message to send
        message: String,
    },

    /// List the tools the model is offered
    Tools,

    /// Show the effective configuration and where it came from
    Config,
}

fn load_config(overrides: &Overrides) -> Result<(RelayConfig, ConfigSources)> {
    let (mut config, sources) = RelayConfig::load_with_sources_from(overrides.config.as_deref())
        .context("Failed to load configuration")?;
    overrides.apply(&mut config);
    Ok((config, sources))
}

fn init_tracing(config: &RelayConfig) {
    let filter = EnvFilter::try_new(&config.telemetry.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_orchestrator(
    config: &RelayConfig,
) -> Result<Orchestrator<toolrelay::SpawnChannel, toolrelay::GeminiClient>> {
    config.validate().context("Incomplete configuration")?;
    Orchestrator::from_config(config).context("Failed to set up model client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, sources) = load_config(&cli.overrides)?;
    init_tracing(&config);
    tracing::debug!(
        files = ?sources.files,
        env = ?sources.env_overrides,
        "configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let orchestrator = build_orchestrator(&config)?;
            chat::run(&orchestrator).await?;
        }
        Commands::Ask { message } => {
            let orchestrator = build_orchestrator(&config)?;
            commands::ask(&orchestrator, &message).await?;
        }
        Commands::Tools => {
            let orchestrator = build_orchestrator(&config)?;
            commands::tools(&orchestrator).await?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_subcommand_is_chat() {
        let cli = Cli::try_parse_from(["relaychat"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "relaychat",
            "ask",
            "hello",
            "--endpoint",
            "https://example.test/generate",
            "--tool-command",
            "/opt/tools/hello-mcp",
            "--insecure",
        ])
        .unwrap();

        let mut config = RelayConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.model.endpoint, "https://example.test/generate");
        assert_eq!(config.tools.command, PathBuf::from("/opt/tools/hello-mcp"));
        assert!(config.model.insecure_skip_verify);
        assert!(matches!(cli.command, Some(Commands::Ask { message }) if message == "hello"));
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = RelayConfig::default();
        config.model.endpoint = "https://from.file/generate".to_string();
        Overrides::default().apply(&mut config);
        assert_eq!(config.model.endpoint, "https://from.file/generate");
        assert!(!config.model.insecure_skip_verify);
    }
}
