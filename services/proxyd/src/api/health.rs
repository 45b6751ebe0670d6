//! Health check endpoints.
//!
//! Used by load balancers and orchestration systems to check the daemon.
//! The proxy holds no external dependencies, so readiness reports the
//! live table counts instead of dependency probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status: "ok".
    pub status: String,

    /// Service name.
    pub service: String,

    /// Service version.
    pub version: String,

    /// Current timestamp (ISO 8601).
    pub timestamp: String,

    /// Live proxy table counts (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyHealth>,
}

/// Snapshot of the proxy tables.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ProxyHealth {
    /// Registered mappings.
    pub mappings: usize,

    /// Registered aliases.
    pub aliases: usize,

    /// Connections currently being relayed.
    pub active_connections: u64,
}

/// Create health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

/// Basic health check - is the service running?
async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "portwayd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        proxy: None,
    })
}

/// Readiness check with current proxy table counts.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let proxy = ProxyHealth {
        mappings: state.engine().mapping_count().await,
        aliases: state.engine().alias_count().await,
        active_connections: state.engine().active_connections().await,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        service: "portwayd".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        proxy: Some(proxy),
    })
}

/// Liveness check - minimal 200 for probes.
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz_returns_ok() {
        let response = healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_livez_returns_ok() {
        let response = livez().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
