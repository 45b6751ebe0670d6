//! portway forwarding daemon library.
//!
//! This crate primarily ships the `portwayd` binary, but we expose a small
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod proxy;
pub mod state;

pub use proxy::{Alias, Mapping, ProxyEngine, ProxyError};
