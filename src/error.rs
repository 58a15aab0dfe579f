use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Task attempt invalid or expired")]
    InvalidOrExpiredAttempt,

    #[error("Task capacity exhausted")]
    TaskUnavailable,

    #[error("Task attempt already settled")]
    AlreadySettled,

    #[error("Task escrow depleted")]
    TaskDepleted,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Transient store failure: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Uniform error envelope returned to clients
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub success: bool,
    pub error: bool,
}

impl AppError {
    /// True when retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InsufficientFunds => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::InvalidOrExpiredAttempt => StatusCode::NOT_FOUND,
            AppError::TaskUnavailable | AppError::AlreadySettled | AppError::TaskDepleted => {
                StatusCode::CONFLICT
            }
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors keep their context in the log, never in the response
        let message = match &self {
            AppError::Internal(context) => {
                error!("internal error: {context}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            message,
            success: false,
            error: true,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("{error:?}"))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
