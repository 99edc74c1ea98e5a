use crate::application::error::ServiceError;
use crate::application::sensor_gateway::UpstreamError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Handler-level error. Every variant renders as `{ "error": <message> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to build response")]
    Response(StatusCode),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn missing(parameter: &str) -> Self {
        AppError::BadRequest(format!("Missing required parameter: {}", parameter))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Upstream(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Response(status) => (*status, self.to_string()),
            AppError::Service(e) => match e {
                ServiceError::InstrumentNotFound(_) | ServiceError::ProjectNotFound(_) => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
                ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, e.to_string()),
                ServiceError::Unsupported(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ServiceError::Upstream(_) | ServiceError::Decode(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
                ServiceError::Repository(err) => {
                    tracing::error!(error = %err, "Repository error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
