//! Aliases command (host names resolving to IPs).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Aliases command.
#[derive(Debug, Args)]
pub struct AliasesCommand {
    #[command(subcommand)]
    command: AliasesSubcommand,
}

#[derive(Debug, Subcommand)]
enum AliasesSubcommand {
    /// List all aliases.
    List,

    /// Create or overwrite an alias.
    Set(SetAliasArgs),

    /// Delete an alias.
    Delete(DeleteAliasArgs),
}

#[derive(Debug, Args)]
struct SetAliasArgs {
    /// Alias name (bare hostname, no port).
    name: String,

    /// IP the alias resolves to, or `me` for the caller's own IP.
    ip: String,
}

#[derive(Debug, Args)]
struct DeleteAliasArgs {
    /// Name of the alias to remove.
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct AliasResponse {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "IP")]
    ip: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ListAliasesResponse {
    items: Vec<AliasResponse>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct UpsertAliasRequest {
    name: String,
    ip: String,
}

#[derive(Debug, Serialize)]
struct DeleteAliasRequest {
    name: String,
}

impl AliasesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AliasesSubcommand::List => list_aliases(ctx).await,
            AliasesSubcommand::Set(args) => set_alias(ctx, args).await,
            AliasesSubcommand::Delete(args) => delete_alias(ctx, args).await,
        }
    }
}

async fn list_aliases(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let response: ListAliasesResponse = client.get("/v1/aliases").await?;

    match ctx.format {
        OutputFormat::Table => print_output(&response.items, ctx.format),
        OutputFormat::Json => print_single(&response, ctx.format),
    }

    Ok(())
}

async fn set_alias(ctx: CommandContext, args: SetAliasArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = UpsertAliasRequest {
        name: args.name,
        ip: args.ip,
    };

    let response: AliasResponse = client.put("/v1/aliases", &request).await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!(
            "Alias {} -> {}",
            response.name, response.ip
        )),
        OutputFormat::Json => print_single(&response, ctx.format),
    }

    Ok(())
}

async fn delete_alias(ctx: CommandContext, args: DeleteAliasArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = DeleteAliasRequest {
        name: args.name.clone(),
    };

    client
        .delete("/v1/aliases", &request)
        .await
        .map_err(|e| match e {
            CliError::Api { status: 404, .. } => {
                CliError::NotFound(format!("Alias '{}' not found", args.name))
            }
            other => other,
        })?;

    print_success(&format!("Deleted alias {}", args.name));
    Ok(())
}
