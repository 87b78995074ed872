//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for statistics and insight requests. A client that
//! disconnects drops its handler, which cancels every upstream call it started.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::TrendlensError;
use crate::pipeline::{Pipeline, QueryRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Build the API router around a pipeline.
pub fn router(pipeline: Pipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/stats", post(stats))
        .route("/insights", post(insights))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let app = router(Pipeline::new(settings)?);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Trendlens API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Statistics", "POST /stats");
    Output::kv("Insights", "POST /insights");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a pipeline error to an HTTP response.
fn error_response(e: TrendlensError) -> Response {
    let status = match &e {
        TrendlensError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TrendlensError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        TrendlensError::Platform(_)
        | TrendlensError::PlatformRejected(_)
        | TrendlensError::OpenAI(_)
        | TrendlensError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Request failed ({}): {}", status, e);

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    match state.pipeline.statistics(&req).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn insights(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    match state.pipeline.insights(&req).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}
