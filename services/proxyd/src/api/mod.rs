//! HTTP control-plane handlers and routing.

pub mod error;

mod aliases;
mod health;
mod mappings;

use std::net::SocketAddr;

use axum::{
    http::{header, HeaderMap, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::proxy::{join_host_port, split_host_port};
use crate::state::AppState;

/// Reserved host token meaning "the caller's own IP".
///
/// Substituted here at the HTTP edge; the proxy engine never sees it.
pub const SELF_TOKEN: &str = "me";

/// Create the control API router with all routes and middleware.
///
/// Handlers extract the peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        // Health endpoints
        .merge(health::routes())
        // API v1 routes
        .nest("/v1/mappings", mappings::routes())
        .nest("/v1/aliases", aliases::routes())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Application state
        .with_state(state)
}

/// Best-effort client IP: first `X-Forwarded-For` entry when present,
/// otherwise the peer address of the connection.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    peer.ip().to_string()
}

/// Replace the reserved self token in a forward address with the caller's
/// IP. Anything that is not "me:port" passes through untouched; malformed
/// addresses are left for the engine to report.
fn resolve_self_token(forward_addr: &str, caller_ip: &str) -> String {
    match split_host_port(forward_addr) {
        Ok((host, port)) if host == SELF_TOKEN => join_host_port(caller_ip, port),
        _ => forward_addr.to_string(),
    }
}
