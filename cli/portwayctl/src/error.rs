//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("API error: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error from a problem document.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::Api { status, .. } if *status == 409 => {
                eprintln!(
                    "\n{}",
                    "Hint: Use `pwy mappings update` to change an existing mapping.".yellow()
                );
            }
            CliError::Api { code, .. } if !code.is_empty() => {
                eprintln!("\nProblem code: {}", code);
            }
            CliError::Network(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check that portwayd is running and --api-url points at it.".yellow()
                );
            }
            _ => {}
        }
    }
}
