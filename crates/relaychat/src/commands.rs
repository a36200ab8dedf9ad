//! One-shot subcommands.

use anyhow::{Context, Result};
use relayconf::{ConfigSources, RelayConfig};
use toolrelay::{ModelClient, Orchestrator, ToolChannel};

pub async fn ask<C: ToolChannel, M: ModelClient>(
    orchestrator: &Orchestrator<C, M>,
    message: &str,
) -> Result<()> {
    let reply = orchestrator
        .process_message(message)
        .await
        .context("Failed to process message")?;
    println!("{}", reply);
    Ok(())
}

pub async fn tools<C: ToolChannel, M: ModelClient>(orchestrator: &Orchestrator<C, M>) -> Result<()> {
    let tools = orchestrator
        .available_tools()
        .await
        .context("Failed to list tools")?;

    if tools.is_empty() {
        println!("No tools available");
        return Ok(());
    }

    for tool in &tools {
        if tool.description.is_empty() {
            println!("{}", tool.name);
        } else {
            println!("{} - {}", tool.name, tool.description);
        }
    }
    Ok(())
}

pub fn show_config(config: &RelayConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());

    println!();
    if sources.files.is_empty() {
        println!("# no config files loaded");
    } else {
        for file in &sources.files {
            println!("# loaded: {}", file.display());
        }
    }
    for var in &sources.env_overrides {
        println!("# env override: {}", var);
    }
}
