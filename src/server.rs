use axum::{Router, http::StatusCode, routing::get};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::security::middleware::access_gate_middleware;

/// Build the router: the front-end's static build behind the access gate.
pub fn build_router(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(site)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            access_gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "gate.config.loaded",
        cookie = %config.gate.cookie_name,
        verify_signature = config.security.verify_signature,
        unresolved_session = ?config.gate.unresolved_session,
        static_dir = %config.server.static_dir,
        "Access gate configured"
    );

    let app = build_router(AppState::new(Arc::clone(&config)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// GET /healthz - Liveness probe.
async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
