//! Portway daemon.
//!
//! A dynamically reconfigurable TCP port-forwarder. The daemon accepts
//! connections on runtime-managed listen addresses and relays them to
//! their configured forward addresses, where the forward host may be an
//! alias resolved through the alias table. Mappings and aliases are
//! mutated at runtime through the HTTP control API.

use std::net::SocketAddr;

use anyhow::Result;
use portway_proxyd::{api, config, proxy::ProxyEngine, state::AppState};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to PORTWAY_LOG_LEVEL)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into());
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting portwayd");
    info!(api_addr = %config.api_addr, "Configuration loaded");

    // Create application state around a fresh engine; listeners are added
    // at runtime through the API
    let state = AppState::new(ProxyEngine::new());

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Build and run the control API server
    let app = api::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.api_addr).await?;
    info!(addr = %config.api_addr, "Control API listening");

    let server_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let mut shutdown_rx = shutdown_rx;
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
            info!("Control API shutting down");
        })
        .await
    });

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Control API exited normally"),
                Ok(Err(e)) => error!(error = %e, "Control API error"),
                Err(e) => error!(error = %e, "Control API task panicked"),
            }
        }
    }

    // Signal the API server, then close the data-plane listeners
    let _ = shutdown_tx.send(true);
    state.engine().shutdown().await;

    info!("portwayd shutdown complete");
    Ok(())
}
