use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::workflow::WorkflowError;

/// Maps workflow failures to a bare status code; the body stays empty.
#[derive(Debug)]
pub struct AppError(pub WorkflowError);

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        Self(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        status.into_response()
    }
}
