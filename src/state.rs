use std::sync::Arc;

use crate::config::Config;
use crate::services::pipeline::DocumentOrchestrator;

// --- Shared application state ---
//
// One orchestrator instance serves all requests; constructed at startup and
// passed by handle to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DocumentOrchestrator>,
    pub config: Arc<Config>,
}
