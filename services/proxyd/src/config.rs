//! Daemon configuration.

use anyhow::{Context, Result};

/// Daemon configuration (env-driven).
#[derive(Debug, Clone)]
pub struct Config {
    /// Control API bind address (example: 127.0.0.1:7070).
    pub api_addr: String,

    /// Log level fallback when RUST_LOG is unset (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_addr =
            std::env::var("PORTWAY_API_ADDR").unwrap_or_else(|_| "127.0.0.1:7070".to_string());
        if !api_addr.contains(':') {
            return Err(anyhow::anyhow!("invalid PORTWAY_API_ADDR: {api_addr}"))
                .context("PORTWAY_API_ADDR must be a host:port address.");
        }

        let log_level = std::env::var("PORTWAY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = std::env::var("PORTWAY_LOG_JSON")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        Ok(Self {
            api_addr,
            log_level,
            log_json,
        })
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.to_lowercase() == "true"
}
