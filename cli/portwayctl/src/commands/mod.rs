//! CLI commands.

mod aliases;
mod mappings;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::output::OutputFormat;

/// portway CLI - manage TCP port mappings and host aliases.
#[derive(Debug, Parser)]
#[command(name = "pwy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Base URL of the portwayd control API.
    #[arg(
        long,
        global = true,
        env = "PORTWAY_API_URL",
        default_value = "http://127.0.0.1:7070"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage port mappings.
    Mappings(mappings::MappingsCommand),

    /// Manage host aliases.
    Aliases(aliases::AliasesCommand),

    /// Show daemon status.
    Status(status::StatusCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let ctx = CommandContext {
            api_url: self.api_url,
            format,
        };

        match self.command {
            Commands::Mappings(cmd) => cmd.run(ctx).await,
            Commands::Aliases(cmd) => cmd.run(ctx).await,
            Commands::Status(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("pwy {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub api_url: String,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Get an API client.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.api_url)
    }
}
