//! Workflow endpoints.
//!
//! POST /v1/workflow/perform: body: `WorkflowRequest`; response: status only.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};

use super::error::AppError;
use super::AppState;
use crate::bpa::{AuthToken, WorkflowRequest};

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/workflow/perform", post(perform))
}

/// POST /v1/workflow/perform
///
/// Forwards the caller's bearer token when present, otherwise the service token.
async fn perform(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WorkflowRequest>,
) -> Result<StatusCode, AppError> {
    let caller_token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(AuthToken::from_header_value);

    match caller_token {
        Some(token) => state.workflows.with_token(token).perform_process(&request).await?,
        None => state.workflows.perform_process(&request).await?,
    };

    Ok(StatusCode::OK)
}
