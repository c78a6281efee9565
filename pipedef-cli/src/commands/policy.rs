//! Organization resource policy command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pipedef_core::Bag;
use pipedef_core::domain::policy::ResourcePolicy;
use pipedef_provider::acceptance::types;
use pipedef_provider::resource::find_resource_policy;
use pipedef_provider::repository::ResourcePolicyRepository;
use pipedef_provider::{Config, ResourceData, ResourcePolicyResource};
use std::sync::Arc;

use super::{interruptible, print_state, read_config_file};

/// Resource policy subcommands
#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Show the organization's resource policy
    Get,
    /// Attach or replace the resource policy from a JSON file
    Apply {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        file: String,
    },
    /// Detach the resource policy
    Delete,
}

/// Handle resource policy commands
pub async fn handle_policy_command(command: PolicyCommands, config: &Config) -> Result<()> {
    let client = Arc::new(config.client());
    let resource = ResourcePolicyResource::new(client.clone());

    match command {
        PolicyCommands::Get => {
            let ctx = interruptible(config.timeouts.read);
            match find_resource_policy(client.as_ref(), &ctx).await {
                Ok(policy) => {
                    print_policy(&policy);
                    Ok(())
                }
                Err(err) if err.is_not_found() => {
                    println!("{}", "No resource policy attached.".yellow());
                    Ok(())
                }
                Err(err) => Err(err).context("Failed to read resource policy"),
            }
        }
        PolicyCommands::Apply { file } => {
            let bag = read_config_file(&file)?;
            let existing = current_policy_id(client.as_ref(), config).await?;
            apply_policy(&resource, config, bag, existing).await
        }
        PolicyCommands::Delete => {
            let Some(policy_id) = current_policy_id(client.as_ref(), config).await? else {
                println!("{}", "No resource policy attached.".yellow());
                return Ok(());
            };

            let mut data = ResourcePolicyResource::import(&policy_id);
            let ctx = interruptible(config.timeouts.delete);
            resource
                .delete(&ctx, &mut data)
                .await
                .context("Failed to delete resource policy")?;

            println!(
                "{} {}",
                "✓ Detached resource policy".green(),
                policy_id.bold()
            );
            Ok(())
        }
    }
}

/// Id of the attached policy, if any
async fn current_policy_id(
    repo: &dyn ResourcePolicyRepository,
    config: &Config,
) -> Result<Option<String>> {
    let ctx = interruptible(config.timeouts.read);
    match find_resource_policy(repo, &ctx).await {
        Ok(policy) => Ok(Some(policy.id)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err).context("Failed to read resource policy"),
    }
}

async fn apply_policy(
    resource: &ResourcePolicyResource,
    config: &Config,
    bag: Bag,
    existing: Option<String>,
) -> Result<()> {
    let schema = ResourcePolicyResource::schema();
    let ctx = interruptible(config.timeouts.create);

    let (data, verb) = match existing {
        Some(id) => {
            let mut data = ResourceData::from_state(schema, id, bag);
            resource
                .update(&ctx, &mut data)
                .await
                .context("Failed to update resource policy")?;
            (data, "Updated")
        }
        None => {
            let mut data = ResourceData::from_config(schema, bag);
            resource
                .create(&ctx, &mut data)
                .await
                .context("Failed to attach resource policy")?;
            (data, "Attached")
        }
    };

    println!(
        "{} {}",
        format!("✓ {} resource policy", verb).green(),
        data.id().unwrap_or_default().bold()
    );
    print_state(types::RESOURCE_POLICY, &data)
}

fn print_policy(policy: &ResourcePolicy) {
    println!("  {} Resource policy {}", "▸".cyan(), policy.id.bold());
    println!("    ARN:      {}", policy.arn.dimmed());
    if !policy.tags.is_empty() {
        let tags: Vec<String> = policy
            .tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("    Tags:     {}", tags.join(", "));
    }
    println!("    Content:");
    println!("{}", policy.content);
}
