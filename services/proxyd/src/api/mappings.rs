//! Mapping endpoints.
//!
//! Listen addresses make poor path segments, so every request carries its
//! key in the JSON body.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::{client_ip, resolve_self_token};
use crate::proxy::{split_host_port, Mapping};
use crate::state::AppState;

/// Create mapping routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_mappings)
            .post(create_mapping)
            .put(update_mapping)
            .delete(delete_mapping),
    )
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create or update a mapping.
#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    /// Address to accept connections on ("host:port").
    pub listen_addr: String,

    /// Destination address ("host:port"; host may be an alias name or the
    /// reserved self token).
    pub forward_addr: String,
}

/// Request to delete a mapping.
#[derive(Debug, Deserialize)]
pub struct DeleteMappingRequest {
    /// Listen address of the mapping to remove.
    pub listen_addr: String,
}

/// Response for listing mappings.
#[derive(Debug, Serialize)]
pub struct ListMappingsResponse {
    /// Registered mappings.
    pub items: Vec<Mapping>,

    /// Total count.
    pub total: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all mappings.
///
/// GET /v1/mappings
async fn list_mappings(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.engine().list_mappings().await;
    let total = items.len();

    Json(ListMappingsResponse { items, total })
}

/// Create a mapping and start its listener.
///
/// POST /v1/mappings
async fn create_mapping(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<MappingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = client_ip(&headers, peer);
    let forward_addr = resolve_self_token(&req.forward_addr, &caller);

    // Catch a malformed forward address here instead of on every failed
    // connection later. The listen address is checked by the bind.
    split_host_port(&forward_addr)?;

    state
        .engine()
        .add_mapping(&req.listen_addr, &forward_addr)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Mapping {
            listen_addr: req.listen_addr,
            forward_addr,
        }),
    ))
}

/// Replace the forward address of an existing mapping.
///
/// PUT /v1/mappings
async fn update_mapping(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<MappingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = client_ip(&headers, peer);
    let forward_addr = resolve_self_token(&req.forward_addr, &caller);

    split_host_port(&forward_addr)?;

    state
        .engine()
        .update_mapping(&req.listen_addr, &forward_addr)
        .await?;

    Ok(Json(Mapping {
        listen_addr: req.listen_addr,
        forward_addr,
    }))
}

/// Remove a mapping and close its listener.
///
/// DELETE /v1/mappings
async fn delete_mapping(
    State(state): State<AppState>,
    Json(req): Json<DeleteMappingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine().delete_mapping(&req.listen_addr).await?;

    Ok(StatusCode::NO_CONTENT)
}
