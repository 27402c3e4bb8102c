// Application state module
// Immutable state shared by every request handler

use std::sync::Arc;

use super::types::Config;
use crate::clock::Clock;

/// Application state
pub struct AppState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }
}
