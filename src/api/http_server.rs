// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: router construction and read-only endpoints

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::errors::{ApiError, ApiErrorResponse};
use super::segment::{segment_box_handler, segment_point_handler, segment_points_handler};
use crate::sam::SegmentEngine;
use crate::version;

/// Shared request state: the one model adapter, injected at startup.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SegmentEngine>,
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/segment/point", post(segment_point_handler))
        .route("/segment/points", post(segment_points_handler))
        .route("/segment/box", post(segment_box_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("{} listening on {}", version::get_version_string(), addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// GET / - Service status
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.engine.is_ready() {
        "ready"
    } else {
        "not ready"
    };

    axum::response::Json(json!({
        "service": version::SERVICE_NAME,
        "version": version::VERSION,
        "model": state.engine.variant(),
        "device": state.engine.device(),
        "status": status,
    }))
}

/// GET /health - 200 when the model is ready, 503 otherwise
async fn health_handler(
    State(state): State<AppState>,
) -> Result<axum::response::Json<serde_json::Value>, ApiErrorResponse> {
    if !state.engine.is_ready() {
        return Err(ApiError::ServiceUnavailable("SAM model not ready".to_string()).into());
    }

    Ok(axum::response::Json(json!({
        "status": "healthy",
        "model": state.engine.variant(),
        "device": state.engine.device(),
    })))
}
