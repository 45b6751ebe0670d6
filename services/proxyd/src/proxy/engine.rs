//! Proxy engine: alias/mapping CRUD plus listener lifecycle.
//!
//! All shared state lives in one aggregate behind a single
//! `tokio::sync::RwLock`. Mutations hold the write lock across both the
//! socket operation and the table updates, so a mapping entry exists
//! exactly when its listener is open. Connection tasks take short read
//! locks and never block writers for longer than a map lookup.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;

use super::error::ProxyError;
use super::listener::{ListenerHandle, ListenerSupervisor};
use super::tables::{Alias, AliasTable, Mapping, MappingStore};

/// Default timeout for upstream connect attempts.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared mutable proxy state.
#[derive(Default)]
pub(crate) struct ProxyState {
    pub(crate) aliases: AliasTable,
    pub(crate) mappings: MappingStore,
    pub(crate) listeners: HashMap<String, ListenerHandle>,
}

pub(crate) type SharedProxyState = Arc<RwLock<ProxyState>>;

/// The proxy façade.
///
/// Cheap to share: connection tasks hold a clone of the inner state, so
/// the engine itself can live inside application state by reference.
pub struct ProxyEngine {
    state: SharedProxyState,
    dial_timeout: Duration,
}

impl ProxyEngine {
    /// Engine with the default dial timeout.
    pub fn new() -> Self {
        Self::with_dial_timeout(DEFAULT_DIAL_TIMEOUT)
    }

    /// Engine with a custom upstream connect timeout.
    pub fn with_dial_timeout(dial_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(ProxyState::default())),
            dial_timeout,
        }
    }

    /// Register a mapping, bind its listener, and start accepting.
    ///
    /// The bind happens under the write lock so a concurrent `add_mapping`
    /// for the same address observes either nothing or the finished pair
    /// of mapping entry and live listener.
    pub async fn add_mapping(&self, listen_addr: &str, forward_addr: &str) -> Result<(), ProxyError> {
        let mut state = self.state.write().await;

        if state.mappings.contains(listen_addr) {
            return Err(ProxyError::AlreadyExists(listen_addr.to_string()));
        }

        let listener = TcpListener::bind(listen_addr)
            .await
            .map_err(|e| ProxyError::Bind {
                addr: listen_addr.to_string(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| ProxyError::Bind {
            addr: listen_addr.to_string(),
            source: e,
        })?;

        state.mappings.insert(Mapping {
            listen_addr: listen_addr.to_string(),
            forward_addr: forward_addr.to_string(),
        });
        let handle = ListenerSupervisor::spawn(
            listen_addr.to_string(),
            listener,
            local_addr,
            Arc::clone(&self.state),
            self.dial_timeout,
        );

        info!(
            listen_addr = %listen_addr,
            local_addr = %handle.local_addr(),
            forward_addr = %forward_addr,
            "Mapping added"
        );
        state.listeners.insert(listen_addr.to_string(), handle);
        Ok(())
    }

    /// Replace the forward address of an existing mapping.
    ///
    /// The listener keeps running; connections accepted after this call
    /// dial the new address, established relays are untouched.
    pub async fn update_mapping(
        &self,
        listen_addr: &str,
        forward_addr: &str,
    ) -> Result<(), ProxyError> {
        let mut state = self.state.write().await;

        if !state.mappings.update_forward(listen_addr, forward_addr) {
            return Err(ProxyError::MappingNotFound(listen_addr.to_string()));
        }

        info!(
            listen_addr = %listen_addr,
            forward_addr = %forward_addr,
            "Mapping forward address updated"
        );
        Ok(())
    }

    /// Remove a mapping and close its listener.
    ///
    /// Mapping entry and listener handle leave the tables in one critical
    /// section; the socket close is then awaited outside the lock, so by
    /// the time this returns no new connection can reach the old listener.
    /// Established relays run to completion.
    pub async fn delete_mapping(&self, listen_addr: &str) -> Result<(), ProxyError> {
        let handle = {
            let mut state = self.state.write().await;

            if state.mappings.remove(listen_addr).is_none() {
                return Err(ProxyError::MappingNotFound(listen_addr.to_string()));
            }
            state.listeners.remove(listen_addr)
        };

        if let Some(handle) = handle {
            handle.shutdown().await;
        }

        info!(listen_addr = %listen_addr, "Mapping deleted");
        Ok(())
    }

    /// Snapshot of all mappings.
    pub async fn list_mappings(&self) -> Vec<Mapping> {
        self.state.read().await.mappings.list()
    }

    /// Insert or overwrite an alias.
    pub async fn upsert_alias(&self, name: &str, ip: &str) {
        let mut state = self.state.write().await;
        let replaced = state.aliases.upsert(name, ip);

        info!(name = %name, ip = %ip, replaced = replaced, "Alias stored");
    }

    /// Remove an alias.
    pub async fn delete_alias(&self, name: &str) -> Result<(), ProxyError> {
        let mut state = self.state.write().await;

        if state.aliases.remove(name).is_none() {
            return Err(ProxyError::AliasNotFound(name.to_string()));
        }

        info!(name = %name, "Alias deleted");
        Ok(())
    }

    /// Snapshot of all aliases.
    pub async fn list_aliases(&self) -> Vec<Alias> {
        self.state.read().await.aliases.list()
    }

    /// Number of mappings.
    pub async fn mapping_count(&self) -> usize {
        self.state.read().await.mappings.len()
    }

    /// Number of aliases.
    pub async fn alias_count(&self) -> usize {
        self.state.read().await.aliases.len()
    }

    /// Currently active relayed connections across all listeners.
    pub async fn active_connections(&self) -> u64 {
        let state = self.state.read().await;
        state
            .listeners
            .values()
            .map(|handle| handle.stats().connections_active.load(Ordering::Relaxed))
            .sum()
    }

    /// Close every listener and wait for their accept loops to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<ListenerHandle> = {
            let mut state = self.state.write().await;
            state.mappings.clear();
            state.listeners.drain().map(|(_, handle)| handle).collect()
        };

        for handle in handles {
            handle.shutdown().await;
        }

        info!("All listeners closed");
    }
}

impl Default for ProxyEngine {
    fn default() -> Self {
        Self::new()
    }
}
