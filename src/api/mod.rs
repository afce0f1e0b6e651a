//! HTTP surface.
//!
//! POST /v1/workflow/perform: forward a workflow action to the engine
//! GET  /health: liveness

pub mod error;
pub mod workflow_routes;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::workflow::WorkflowService;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub workflows: Arc<WorkflowService>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Build the full router with all routes and middleware.
pub fn build_router(workflows: Arc<WorkflowService>) -> Router {
    let state = AppState { workflows };

    Router::new()
        .route("/health", get(health))
        .merge(workflow_routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
