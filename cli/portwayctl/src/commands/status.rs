//! Status command - show daemon health and proxy counters.

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::output::{print_single, OutputFormat};

use super::CommandContext;

/// Status command.
#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        show_status(ctx).await
    }
}

/// Readiness response from the daemon.
#[derive(Debug, Serialize, Deserialize)]
struct StatusResponse {
    /// Service status: "ok".
    status: String,

    /// Service name.
    service: String,

    /// Daemon version.
    version: String,

    /// Response timestamp.
    timestamp: String,

    /// Proxy counters.
    #[serde(default)]
    proxy: Option<ProxyCounts>,
}

/// Proxy counter summary.
#[derive(Debug, Serialize, Deserialize)]
struct ProxyCounts {
    /// Registered mappings.
    mappings: usize,

    /// Registered aliases.
    aliases: usize,

    /// Connections currently being relayed.
    active_connections: u64,
}

async fn show_status(ctx: CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let response: StatusResponse = client.get("/readyz").await?;

    match ctx.format {
        OutputFormat::Json => {
            print_single(&response, ctx.format);
        }
        OutputFormat::Table => {
            print_status_table(&response);
        }
    }

    Ok(())
}

/// Print status in a human-readable format.
fn print_status_table(status: &StatusResponse) {
    println!("Service: {} {}", status.service, status.version);
    println!("Status:  {}", status.status);
    println!();

    if let Some(proxy) = &status.proxy {
        println!("PROXY");
        println!(
            "  Mappings: {}  Aliases: {}  Active connections: {}",
            proxy.mappings, proxy.aliases, proxy.active_connections
        );
    }
}
