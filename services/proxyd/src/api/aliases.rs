//! Alias endpoints.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::{client_ip, SELF_TOKEN};
use crate::proxy::Alias;
use crate::state::AppState;

/// Create alias routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_aliases).put(upsert_alias).delete(delete_alias),
    )
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create or overwrite an alias.
#[derive(Debug, Deserialize)]
pub struct UpsertAliasRequest {
    /// Alias name (bare hostname, no port).
    pub name: String,

    /// IP literal, or the reserved self token for the caller's IP.
    pub ip: String,
}

/// Request to delete an alias.
#[derive(Debug, Deserialize)]
pub struct DeleteAliasRequest {
    /// Name of the alias to remove.
    pub name: String,
}

/// Response for listing aliases.
#[derive(Debug, Serialize)]
pub struct ListAliasesResponse {
    /// Registered aliases.
    pub items: Vec<Alias>,

    /// Total count.
    pub total: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all aliases.
///
/// GET /v1/aliases
async fn list_aliases(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.engine().list_aliases().await;
    let total = items.len();

    Json(ListAliasesResponse { items, total })
}

/// Create or overwrite an alias. Never conflicts.
///
/// PUT /v1/aliases
async fn upsert_alias(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<UpsertAliasRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_name",
            "Alias name cannot be empty",
        ));
    }
    if req.name.contains(':') {
        return Err(ApiError::bad_request(
            "invalid_name",
            "Alias name must be a bare hostname without a port",
        ));
    }

    let ip = if req.ip == SELF_TOKEN {
        client_ip(&headers, peer)
    } else {
        req.ip
    };

    if ip.parse::<IpAddr>().is_err() {
        return Err(ApiError::bad_request(
            "invalid_ip",
            format!("{} is not an IP address", ip),
        ));
    }

    state.engine().upsert_alias(&req.name, &ip).await;

    Ok(Json(Alias { name: req.name, ip }))
}

/// Remove an alias.
///
/// DELETE /v1/aliases
async fn delete_alias(
    State(state): State<AppState>,
    Json(req): Json<DeleteAliasRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine().delete_alias(&req.name).await?;

    Ok(StatusCode::NO_CONTENT)
}
