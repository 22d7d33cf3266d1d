use std::sync::Arc;

use crate::config::GameConfig;
use crate::live::SessionOrchestrator;

/// Application state containing shared resources.
///
/// The orchestrator is an explicitly owned, injected component: every
/// `AppState` gets its own registry, hub, and grace tracker, so tests can
/// run any number of independent instances side by side.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<SessionOrchestrator>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            orchestrator: SessionOrchestrator::new(config),
        }
    }

    pub fn with_orchestrator(orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> Arc<SessionOrchestrator> {
        Arc::clone(&self.orchestrator)
    }
}
