//! Application state shared across request handlers.

use std::sync::Arc;

use crate::proxy::ProxyEngine;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    engine: ProxyEngine,
}

impl AppState {
    /// Create a new application state.
    pub fn new(engine: ProxyEngine) -> Self {
        Self {
            inner: Arc::new(AppStateInner { engine }),
        }
    }

    /// Get a reference to the proxy engine.
    pub fn engine(&self) -> &ProxyEngine {
        &self.inner.engine
    }
}
