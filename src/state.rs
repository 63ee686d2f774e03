//! Shared application state.

use std::sync::Arc;

use crate::config::RelayConfig;

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    /// Server and session configuration.
    pub config: RelayConfig,
}

impl AppState {
    /// Create shared application state from a configuration.
    pub fn new(config: RelayConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}
