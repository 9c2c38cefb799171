use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jiff::Timestamp;
use snaplink_service::LinkError;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// An error ready to leave the process: a status code and a message
/// safe to show callers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The engine call outlived its deadline.
    pub fn timeout() -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "request timed out")
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::BadRequest(message) => Self::new(StatusCode::BAD_REQUEST, message),
            LinkError::NotFound(code) => {
                Self::new(StatusCode::NOT_FOUND, format!("no such short link: {code}"))
            }
            LinkError::TooManyAttempts => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "short code space exhausted, try again later",
            ),
            LinkError::Store(e) => {
                // Internal detail goes to the log, not the caller.
                error!(error = %e, "store error while serving request");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            message: self.message,
            time: Timestamp::now(),
        };
        (self.status, Json(body)).into_response()
    }
}
