//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use lumen_core::config::LumenConfig;
use lumen_nlq::Orchestrator;

/// Shared application state. Cloned per request; all fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<LumenConfig>,
    /// Question analysis pipeline, including session memory.
    pub orchestrator: Arc<Orchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: LumenConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
