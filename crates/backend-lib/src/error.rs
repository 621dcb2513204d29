// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use warden_common::ErrorResponse;

use crate::gateway::ForwardError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Generic message returned for every failed login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request payload: {0}")]
    Validation(#[from] ValidationError),

    #[error("User already exists")]
    UserExists,

    /// Unknown identity and wrong password both map here.
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("No route for path: {0}")]
    RouteNotFound(String),

    #[error("Upstream {upstream} unavailable: {reason}")]
    UpstreamUnavailable { upstream: String, reason: String },

    #[error("Upstream {upstream} timed out after {timeout_ms}ms")]
    UpstreamTimeout { upstream: String, timeout_ms: u128 },
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UserExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::UserExists => "AUTH_004",
            AppError::Internal(_) => "INT_001",
            AppError::RouteNotFound(_) => "GW_001",
            AppError::UpstreamUnavailable { .. } => "GW_002",
            AppError::UpstreamTimeout { .. } => "GW_003",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Invalid request payload".to_string(),
            AppError::UserExists => "User already exists".to_string(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::RouteNotFound(_) => "Resource not found".to_string(),
            AppError::UpstreamUnavailable { .. } => "Upstream service unavailable".to_string(),
            AppError::UpstreamTimeout { .. } => "Upstream service timed out".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = ErrorResponse::new(self.error_code(), message);
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(_) => AppError::UserExists,
            // Never surfaced as "not found": callers fold it into InvalidCredentials.
            StoreError::NotFound => AppError::InvalidCredentials,
            StoreError::Unavailable(reason) => AppError::Internal(reason),
        }
    }
}

impl From<ForwardError> for AppError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Connect { upstream, reason } => {
                AppError::UpstreamUnavailable { upstream, reason }
            },
            ForwardError::Timeout { upstream, after } => AppError::UpstreamTimeout {
                upstream,
                timeout_ms: after.as_millis(),
            },
        }
    }
}

/// Converts a handler panic into the standard internal error response.
///
/// Installed through `tower_http::catch_panic::CatchPanicLayer::custom` on
/// both routers, so a faulting request never takes the process down.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    AppError::Internal(detail).into_response()
}
