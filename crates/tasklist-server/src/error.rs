//! HTTP error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use tasklist_auth::AuthError;
use tasklist_core::TodoError;

/// Error returned by route handlers and the auth middleware
///
/// Rendered as `{"message": "..."}`. Backend failures are logged and reported
/// without detail.
#[derive(Debug)]
pub enum ApiError {
    /// The authorizer denied the request
    Forbidden,
    /// A to-do operation failed
    Todo(TodoError),
}

impl From<TodoError> for ApiError {
    fn from(error: TodoError) -> Self {
        Self::Todo(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Todo(TodoError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Todo(TodoError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            Self::Todo(TodoError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Todo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Forbidden => "Forbidden".to_string(),
            Self::Todo(e) if e.is_client_error() => e.to_string(),
            Self::Todo(e) => {
                error!(error = %e, "Request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Failures while assembling the application from configuration
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The authorizer could not be built
    #[error("Authorizer setup failed: {0}")]
    Auth(#[from] AuthError),

    /// Attachment signing is misconfigured
    #[error("Attachment setup failed: {0}")]
    Attachments(#[from] TodoError),
}
