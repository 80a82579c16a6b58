pub mod agents;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Assemble the API router. Layers (trace, CORS) are applied in `main`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route(
            "/api/agents",
            get(agents::list_agents_handler).post(agents::run_pipeline_handler),
        )
        .route("/api/agents/process", post(agents::process_document_handler))
}
