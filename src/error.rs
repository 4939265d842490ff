use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Role conflict: {0}")]
    RoleConflict(String),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::EmailError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        // 5xx detail goes to logs, never into the response body.
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::RoleConflict(msg) => (StatusCode::NOT_ACCEPTABLE, msg),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            AppError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            AppError::AccountInactive => {
                (StatusCode::UNAUTHORIZED, "Account is inactive".to_string())
            }
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Token has expired".to_string())
            }
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AppError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string()),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::EmailError(msg) => {
                tracing::error!(error = %msg, "email dispatch error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Email delivery failed".to_string(),
                )
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
