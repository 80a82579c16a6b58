use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use ledgerly_backend::config::Config;
use ledgerly_backend::logging::init_subscriber;
use ledgerly_backend::routes::api_router;
use ledgerly_backend::services::pipeline::create_orchestrator;
use ledgerly_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    tracing::info!("Starting Ledgerly backend server...");

    let config = Config::load().context("Failed to load configuration")?;
    let port = config.port;

    // One orchestrator instance serves all requests for the process lifetime.
    let orchestrator = create_orchestrator(&config).context("Failed to build pipeline")?;
    let app_state = AppState {
        orchestrator: Arc::new(orchestrator),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(
            app_state
                .config
                .frontend_base_url
                .parse::<axum::http::HeaderValue>()
                .context("Invalid FRONTEND_BASE_URL")?,
        )
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = api_router()
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
