//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod definition;
mod policy;

pub use definition::DefinitionCommands;
pub use policy::PolicyCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pipedef_core::Bag;
use pipedef_provider::acceptance::ResourceSnapshot;
use pipedef_provider::{Config, OperationContext, ResourceData};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline definition management
    Definition {
        #[command(subcommand)]
        command: DefinitionCommands,
    },
    /// Organization resource policy management
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Definition { command } => {
            definition::handle_definition_command(command, config).await
        }
        Commands::Policy { command } => policy::handle_policy_command(command, config).await,
    }
}

/// Operation context cancelled by Ctrl-C
fn interruptible(timeout: Duration) -> OperationContext {
    let ctx = OperationContext::new(timeout);
    let token = ctx.cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling operation");
            token.cancel();
        }
    });

    ctx
}

/// Read a JSON configuration file holding one resource's attributes
fn read_config_file(path: &str) -> Result<Bag> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;

    match serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?
    {
        Value::Object(bag) => Ok(bag),
        _ => anyhow::bail!("Configuration file {} must contain a JSON object", path),
    }
}

/// Print a resource's state as pretty JSON
fn print_state(resource_type: &str, data: &ResourceData) -> Result<()> {
    let snapshot = ResourceSnapshot::from_data(resource_type, data);
    let rendered = serde_json::to_string_pretty(&snapshot).context("Failed to render state")?;

    println!("{}", "State:".bold());
    println!("{}", rendered);
    Ok(())
}
