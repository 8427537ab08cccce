use crate::config::{AppState, ServerConfig};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(addr: &str, config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("API server listening on {}", addr);
    tracing::info!("MCP endpoint: http://{}/mcp", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tools", get(handlers::list_tools))
        .route("/mcp", post(handlers::mcp_message))
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let portfolio = state.engine.portfolio();

    Json(serde_json::json!({
        "status": "ok",
        "service": state.mcp.info().name,
        "version": env!("CARGO_PKG_VERSION"),
        "companies": portfolio.len(),
        "dataset": portfolio.source(),
        "loaded_at": portfolio.loaded_at().to_rfc3339(),
    }))
}
