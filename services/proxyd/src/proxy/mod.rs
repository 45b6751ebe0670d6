//! Dynamically reconfigurable TCP forwarding.
//!
//! This module provides:
//! - Mapping and alias tables behind a single reader/writer lock
//! - Per-mapping listener supervision with clean shutdown on delete
//! - Per-connection forward-address resolution through the alias table
//! - Bidirectional connection relaying
//!
//! ## Architecture
//!
//! ```text
//! Client -> Listener -> Resolver (aliases + mappings) -> Upstream
//!                 |                                         |
//!                 +----------------- Relay -----------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use portway_proxyd::proxy::ProxyEngine;
//!
//! let engine = ProxyEngine::new();
//! engine.add_mapping("127.0.0.1:19001", "127.0.0.1:19002").await?;
//! engine.upsert_alias("backend", "127.0.0.1").await;
//! ```

mod engine;
mod error;
mod listener;
mod relay;
mod resolver;
mod tables;

pub use engine::{ProxyEngine, DEFAULT_DIAL_TIMEOUT};
pub use error::ProxyError;
pub use resolver::{join_host_port, split_host_port};
pub use tables::{Alias, Mapping};
