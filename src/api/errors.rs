use crate::errors::{AuthError, BrokerError, ChainError, RegistryError, ResultError};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub code: u16,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError({}, {})", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let unauthorized = status == StatusCode::UNAUTHORIZED;
        let mut response = (status, axum::Json(self)).into_response();
        if unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Helper function to create API errors
pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    ApiError {
        message: message.to_string(),
        code: status.as_u16(),
    }
}

/// Logs an unexpected error and hides its details from the client
fn internal(e: impl fmt::Display) -> ApiError {
    error!("Request failed: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                api_error(StatusCode::UNAUTHORIZED, &e.to_string())
            }
            AuthError::InactiveUser => api_error(StatusCode::BAD_REQUEST, &e.to_string()),
            AuthError::Encoding(_) => internal(e),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        internal(e)
    }
}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        internal(e)
    }
}

impl From<BrokerError> for ApiError {
    fn from(e: BrokerError) -> Self {
        error!("Submission rejected: {}", e);
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Task queue unavailable")
    }
}

impl From<ResultError> for ApiError {
    fn from(e: ResultError) -> Self {
        match e {
            ResultError::UnknownSubmission(_) => api_error(StatusCode::NOT_FOUND, "Task not found"),
            other => internal(other),
        }
    }
}
