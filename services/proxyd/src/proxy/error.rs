//! Proxy error taxonomy.
//!
//! Control-plane errors (`AlreadyExists`, `MappingNotFound`, `AliasNotFound`,
//! `Bind`) are returned synchronously to the mutating caller. Data-plane
//! errors (`InvalidAddress`, `ResolutionFailed`, `DialTimeout`, `Dial`,
//! `RelayIo`) stay confined to the connection that hit them.

use thiserror::Error;

/// Proxy errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A mapping is already registered for the listen address.
    #[error("mapping already exists for {0}")]
    AlreadyExists(String),

    /// No mapping registered for the listen address.
    #[error("no mapping for {0}")]
    MappingNotFound(String),

    /// No alias registered under the name.
    #[error("no alias named {0}")]
    AliasNotFound(String),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed address (expected "host:port").
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The forward address did not resolve to any socket address.
    #[error("failed to resolve {0}")]
    ResolutionFailed(String),

    /// Outbound connect did not complete within the dial timeout.
    #[error("timed out connecting to {0}")]
    DialTimeout(String),

    /// Outbound connect failed.
    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an established relay.
    #[error("relay i/o error: {0}")]
    RelayIo(#[from] std::io::Error),
}
