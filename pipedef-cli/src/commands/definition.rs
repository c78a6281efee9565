//! Pipeline definition command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pipedef_core::Bag;
use pipedef_provider::acceptance::types;
use pipedef_provider::{Config, PipelineDefinitionResource, ResourceData};
use std::sync::Arc;

use super::{interruptible, print_state, read_config_file};

/// Pipeline definition subcommands
#[derive(Subcommand)]
pub enum DefinitionCommands {
    /// Submit, activate and read back a definition from a JSON file
    Apply {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        file: String,
    },
    /// Show the stored definition of a pipeline
    Read {
        /// Pipeline ID
        pipeline_id: String,
    },
    /// Start tracking an existing pipeline's definition
    Import {
        /// Pipeline ID
        pipeline_id: String,
    },
    /// Stop tracking a definition; the pipeline is left in place
    Delete {
        /// Pipeline ID
        pipeline_id: String,
    },
}

/// Handle pipeline definition commands
pub async fn handle_definition_command(command: DefinitionCommands, config: &Config) -> Result<()> {
    let resource = PipelineDefinitionResource::new(Arc::new(config.client()))
        .with_retry_policy(config.retry);

    match command {
        DefinitionCommands::Apply { file } => apply_definition(&resource, config, &file).await,
        DefinitionCommands::Read { pipeline_id } => {
            let data = ResourceData::from_state(
                PipelineDefinitionResource::schema(),
                pipeline_id,
                Bag::new(),
            );
            read_definition(&resource, config, data, "Read").await
        }
        DefinitionCommands::Import { pipeline_id } => {
            let data = PipelineDefinitionResource::import(&pipeline_id);
            read_definition(&resource, config, data, "Imported").await
        }
        DefinitionCommands::Delete { pipeline_id } => {
            delete_definition(&resource, config, pipeline_id).await
        }
    }
}

async fn apply_definition(
    resource: &PipelineDefinitionResource,
    config: &Config,
    path: &str,
) -> Result<()> {
    let bag = read_config_file(path)?;
    let mut data = ResourceData::from_config(PipelineDefinitionResource::schema(), bag);

    let ctx = interruptible(config.timeouts.create);
    resource
        .put(&ctx, &mut data)
        .await
        .context("Failed to apply pipeline definition")?;

    println!(
        "{} {}",
        "✓ Applied and activated pipeline definition".green(),
        data.id().unwrap_or_default().bold()
    );
    print_state(types::PIPELINE_DEFINITION, &data)
}

async fn read_definition(
    resource: &PipelineDefinitionResource,
    config: &Config,
    mut data: ResourceData,
    verb: &str,
) -> Result<()> {
    let pipeline_id = data.id().unwrap_or_default().to_string();

    let ctx = interruptible(config.timeouts.read);
    resource
        .read(&ctx, &mut data)
        .await
        .with_context(|| format!("Failed to read pipeline definition {}", pipeline_id))?;

    if data.id().is_none() {
        println!(
            "{}",
            format!("Pipeline {} no longer exists.", pipeline_id).yellow()
        );
        return Ok(());
    }

    println!(
        "{} {}",
        format!("✓ {} pipeline definition", verb).green(),
        pipeline_id.bold()
    );
    print_state(types::PIPELINE_DEFINITION, &data)
}

async fn delete_definition(
    resource: &PipelineDefinitionResource,
    config: &Config,
    pipeline_id: String,
) -> Result<()> {
    let mut data = ResourceData::from_state(
        PipelineDefinitionResource::schema(),
        pipeline_id.clone(),
        Bag::new(),
    );

    let ctx = interruptible(config.timeouts.delete);
    resource.delete(&ctx, &mut data).await?;

    println!(
        "{}",
        format!(
            "Stopped tracking the definition of pipeline {}; the pipeline itself was not changed.",
            pipeline_id
        )
        .yellow()
    );
    Ok(())
}
