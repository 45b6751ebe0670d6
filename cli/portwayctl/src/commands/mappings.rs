//! Mappings command (listen address to forward address pairs).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Mappings command.
#[derive(Debug, Args)]
pub struct MappingsCommand {
    #[command(subcommand)]
    command: MappingsSubcommand,
}

#[derive(Debug, Subcommand)]
enum MappingsSubcommand {
    /// List all mappings.
    List,

    /// Add a mapping and start its listener.
    Add(AddMappingArgs),

    /// Change the forward address of an existing mapping.
    Update(UpdateMappingArgs),

    /// Delete a mapping and close its listener.
    Delete(DeleteMappingArgs),
}

#[derive(Debug, Args)]
struct AddMappingArgs {
    /// Address to accept connections on ("host:port").
    listen_addr: String,

    /// Destination address ("host:port"). The host may be an alias name
    /// or `me` for the caller's own IP.
    forward_addr: String,
}

#[derive(Debug, Args)]
struct UpdateMappingArgs {
    /// Listen address of the mapping to change.
    listen_addr: String,

    /// New destination address ("host:port").
    forward_addr: String,
}

#[derive(Debug, Args)]
struct DeleteMappingArgs {
    /// Listen address of the mapping to remove.
    listen_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct MappingResponse {
    #[tabled(rename = "Listen")]
    listen_addr: String,

    #[tabled(rename = "Forward")]
    forward_addr: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ListMappingsResponse {
    items: Vec<MappingResponse>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct MappingRequest {
    listen_addr: String,
    forward_addr: String,
}

#[derive(Debug, Serialize)]
struct DeleteMappingRequest {
    listen_addr: String,
}

impl MappingsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            MappingsSubcommand::List => list_mappings(ctx).await,
            MappingsSubcommand::Add(args) => add_mapping(ctx, args).await,
            MappingsSubcommand::Update(args) => update_mapping(ctx, args).await,
            MappingsSubcommand::Delete(args) => delete_mapping(ctx, args).await,
        }
    }
}

async fn list_mappings(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let response: ListMappingsResponse = client.get("/v1/mappings").await?;

    match ctx.format {
        OutputFormat::Table => print_output(&response.items, ctx.format),
        OutputFormat::Json => print_single(&response, ctx.format),
    }

    Ok(())
}

async fn add_mapping(ctx: CommandContext, args: AddMappingArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = MappingRequest {
        listen_addr: args.listen_addr,
        forward_addr: args.forward_addr,
    };

    let response: MappingResponse = client.post("/v1/mappings", &request).await?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!(
            "Added mapping {} -> {}",
            response.listen_addr, response.forward_addr
        )),
        OutputFormat::Json => print_single(&response, ctx.format),
    }

    Ok(())
}

async fn update_mapping(ctx: CommandContext, args: UpdateMappingArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = MappingRequest {
        listen_addr: args.listen_addr.clone(),
        forward_addr: args.forward_addr,
    };

    let response: MappingResponse = client
        .put("/v1/mappings", &request)
        .await
        .map_err(|e| match e {
            CliError::Api { status: 404, .. } => {
                CliError::NotFound(format!("Mapping '{}' not found", args.listen_addr))
            }
            other => other,
        })?;

    match ctx.format {
        OutputFormat::Table => print_success(&format!(
            "Updated mapping {} -> {}",
            response.listen_addr, response.forward_addr
        )),
        OutputFormat::Json => print_single(&response, ctx.format),
    }

    Ok(())
}

async fn delete_mapping(ctx: CommandContext, args: DeleteMappingArgs) -> Result<()> {
    let client = ctx.client()?;
    let request = DeleteMappingRequest {
        listen_addr: args.listen_addr.clone(),
    };

    client
        .delete("/v1/mappings", &request)
        .await
        .map_err(|e| match e {
            CliError::Api { status: 404, .. } => {
                CliError::NotFound(format!("Mapping '{}' not found", args.listen_addr))
            }
            other => other,
        })?;

    print_success(&format!("Deleted mapping {}", args.listen_addr));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_deserialization() {
        let json = r#"{
            "items": [
                { "listen_addr": "0.0.0.0:8080", "forward_addr": "backend:9090" }
            ],
            "total": 1
        }"#;

        let response: ListMappingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.items[0].listen_addr, "0.0.0.0:8080");
        assert_eq!(response.items[0].forward_addr, "backend:9090");
    }
}
