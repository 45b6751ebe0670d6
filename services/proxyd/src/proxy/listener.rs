//! Listener supervision and per-connection handling.
//!
//! One supervisor task per mapping owns the listening socket and accepts
//! in a loop until the engine signals shutdown. Each accepted connection
//! runs in its own task: it re-reads the mapping's current forward address
//! under the shared read lock, resolves it, dials the upstream with a
//! bounded timeout, and hands the pair to the relay. Connection failures
//! never stop the accept loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, Instrument};

use super::engine::SharedProxyState;
use super::error::ProxyError;
use super::relay::relay_bidirectional;
use super::resolver;

/// Statistics for a listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Total connections accepted.
    pub connections_accepted: AtomicU64,
    /// Connections currently active.
    pub connections_active: AtomicU64,
    /// Total connections closed.
    pub connections_closed: AtomicU64,
    /// Upstream connect successes.
    pub upstream_connected: AtomicU64,
    /// Upstream resolve/connect failures.
    pub upstream_failed: AtomicU64,
    /// Bytes relayed towards the upstream.
    pub bytes_to_upstream: AtomicU64,
    /// Bytes relayed back to clients.
    pub bytes_from_upstream: AtomicU64,
}

/// Handle the engine keeps for one live listener.
///
/// Exists exactly as long as the mapping it belongs to; the engine inserts
/// and removes it in the same critical section as the mapping entry.
pub struct ListenerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: Arc<ListenerStats>,
    local_addr: SocketAddr,
}

impl ListenerHandle {
    /// Actual bound address of the listening socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Listener statistics.
    pub fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    /// Signal the accept loop to stop and wait until the socket is closed.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Accept-loop supervisor for a single mapping.
pub struct ListenerSupervisor {
    listen_addr: String,
    listener: TcpListener,
    state: SharedProxyState,
    dial_timeout: Duration,
    stats: Arc<ListenerStats>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ListenerSupervisor {
    /// Spawn the accept loop for a bound socket, returning the handle the
    /// engine stores alongside the mapping.
    pub fn spawn(
        listen_addr: String,
        listener: TcpListener,
        local_addr: SocketAddr,
        state: SharedProxyState,
        dial_timeout: Duration,
    ) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(ListenerStats::default());

        let supervisor = Self {
            listen_addr,
            listener,
            state,
            dial_timeout,
            stats: Arc::clone(&stats),
            shutdown_rx,
        };
        let task = tokio::spawn(supervisor.run());

        ListenerHandle {
            shutdown_tx,
            task,
            stats,
            local_addr,
        }
    }

    /// Accept connections until shutdown. The socket closes when this
    /// returns and the supervisor is dropped.
    async fn run(mut self) {
        info!(listen_addr = %self.listen_addr, "Listener accepting");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((client, peer_addr)) => self.spawn_connection(client, peer_addr),
                        Err(e) => {
                            error!(listen_addr = %self.listen_addr, error = %e, "Accept error");
                            // Brief sleep to avoid tight loop on persistent errors
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }

        info!(listen_addr = %self.listen_addr, "Listener closed");
    }

    fn spawn_connection(&self, client: TcpStream, peer_addr: SocketAddr) {
        self.stats
            .connections_accepted
            .fetch_add(1, Ordering::Relaxed);
        self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

        let listen_addr = self.listen_addr.clone();
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let dial_timeout = self.dial_timeout;

        tokio::spawn(
            async move {
                if let Err(e) =
                    handle_connection(client, &listen_addr, &state, dial_timeout, &stats).await
                {
                    debug!(
                        listen_addr = %listen_addr,
                        peer_addr = %peer_addr,
                        error = %e,
                        "Connection error"
                    );
                }

                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
                stats.connections_closed.fetch_add(1, Ordering::Relaxed);
            }
            .instrument(tracing::info_span!("connection", peer = %peer_addr)),
        );
    }
}

/// Handle a single accepted connection.
async fn handle_connection(
    mut client: TcpStream,
    listen_addr: &str,
    state: &SharedProxyState,
    dial_timeout: Duration,
    stats: &ListenerStats,
) -> Result<(), ProxyError> {
    // Re-read the forward address on every connection so mapping updates
    // and alias changes apply to the next accept. The lock is dropped
    // before any network resolution.
    let target = {
        let state = state.read().await;
        let forward_addr = state
            .mappings
            .forward_addr(listen_addr)
            .ok_or_else(|| ProxyError::MappingNotFound(listen_addr.to_string()))?;
        resolver::substitute_alias(&forward_addr, &state.aliases)?
    };

    let upstream_addr = match resolver::resolve_addr(&target).await {
        Ok(addr) => addr,
        Err(e) => {
            stats.upstream_failed.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
    };

    let mut upstream = match timeout(dial_timeout, TcpStream::connect(upstream_addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            stats.upstream_failed.fetch_add(1, Ordering::Relaxed);
            return Err(ProxyError::Dial {
                addr: target,
                source: e,
            });
        }
        Err(_) => {
            stats.upstream_failed.fetch_add(1, Ordering::Relaxed);
            return Err(ProxyError::DialTimeout(target));
        }
    };
    stats.upstream_connected.fetch_add(1, Ordering::Relaxed);

    debug!(forward_addr = %target, upstream_addr = %upstream_addr, "Upstream connected");

    let (bytes_to_upstream, bytes_from_upstream) =
        relay_bidirectional(&mut client, &mut upstream).await;

    stats
        .bytes_to_upstream
        .fetch_add(bytes_to_upstream, Ordering::Relaxed);
    stats
        .bytes_from_upstream
        .fetch_add(bytes_from_upstream, Ordering::Relaxed);

    debug!(
        bytes_to_upstream = bytes_to_upstream,
        bytes_from_upstream = bytes_from_upstream,
        "Connection closed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_stats() {
        let stats = ListenerStats::default();
        stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
    }
}
