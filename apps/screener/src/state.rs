use std::path::Path;

use crate::config::Config;
use crate::screening::processor::Processor;
use crate::screening::session::SessionRegistry;
use crate::screening::tracker::StatusTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tracker: StatusTracker,
    pub sessions: SessionRegistry,
    /// Owns the worker pool; the scorer behind it is swappable for tests.
    pub processor: Processor,
}

impl AppState {
    /// Root directory holding one staging directory per session.
    pub fn upload_root(&self) -> &Path {
        &self.config.upload_root
    }
}
