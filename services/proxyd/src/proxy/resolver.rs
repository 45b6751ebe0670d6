//! Forward-address resolution.
//!
//! A forward address is resolved in two stages so the shared lock never
//! covers network I/O: [`substitute_alias`] runs under the read lock and
//! only rewrites the host through the alias table, then [`resolve_addr`]
//! performs the actual DNS/socket lookup with the lock released.
//!
//! Resolution happens once per accepted connection and is never cached, so
//! an alias or mapping change applies to the very next connection.

use std::net::SocketAddr;

use tokio::net::lookup_host;

use super::error::ProxyError;
use super::tables::AliasTable;

/// Split a "host:port" string into host and port.
///
/// IPv6 hosts use bracket notation ("[::1]:443" splits to "::1", 443).
pub fn split_host_port(addr: &str) -> Result<(&str, u16), ProxyError> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| ProxyError::InvalidAddress(addr.to_string()))?;

    let port: u16 = port
        .parse()
        .map_err(|_| ProxyError::InvalidAddress(addr.to_string()))?;

    let host = match host.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .ok_or_else(|| ProxyError::InvalidAddress(addr.to_string()))?,
        None => {
            // Unbracketed colons (bare IPv6) are ambiguous, reject them
            if host.contains(':') {
                return Err(ProxyError::InvalidAddress(addr.to_string()));
            }
            host
        }
    };

    if host.is_empty() {
        return Err(ProxyError::InvalidAddress(addr.to_string()));
    }

    Ok((host, port))
}

/// Join a host and port back into "host:port", bracketing IPv6 hosts.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Rewrite the host part of a forward address through the alias table.
///
/// A miss is not an error: the host falls through as a literal, so "not an
/// alias" and "alias was deleted" behave identically.
pub fn substitute_alias(forward_addr: &str, aliases: &AliasTable) -> Result<String, ProxyError> {
    let (host, port) = split_host_port(forward_addr)?;
    let host = aliases.get(host).unwrap_or(host);
    Ok(join_host_port(host, port))
}

/// Resolve a well-formed "host:port" to its first socket address.
pub async fn resolve_addr(addr: &str) -> Result<SocketAddr, ProxyError> {
    let mut candidates = lookup_host(addr)
        .await
        .map_err(|_| ProxyError::ResolutionFailed(addr.to_string()))?;

    candidates
        .next()
        .ok_or_else(|| ProxyError::ResolutionFailed(addr.to_string()))
}
