//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required request field is missing or blank
    #[error("{0}")]
    Validation(String),

    /// Credentials or API key were rejected
    #[error("{0}")]
    Unauthorized(String),

    /// The user could not be registered (e.g. the username is taken)
    #[error("Registration failed")]
    RegistrationFailed,

    /// The relational store failed; the cause is logged, never returned
    #[error("Storage error: {0}")]
    Storage(String),

    /// An upstream service answered with a non-success status
    #[error("{message} (upstream status {status})")]
    Upstream {
        /// Status code returned by the upstream service
        status: u16,
        /// Human-readable summary of the failed call
        message: String,
        /// Upstream response body, JSON if it parsed, otherwise a string
        body: Value,
    },

    /// An upstream response lacked a field the workflow depends on
    #[error("{0}")]
    MissingField(String),

    /// Transport-level failure while talking to an upstream service
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a body that is not valid JSON
    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Polling gave up before the remote job reached a terminal state
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Replace the summary of an upstream error, leaving other variants alone
    pub fn upstream_context(self, context: &str) -> Self {
        match self {
            AppError::Upstream { status, body, .. } => AppError::Upstream {
                status,
                message: context.to_string(),
                body,
            },
            other => other,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string(), None),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::RegistrationFailed => (StatusCode::BAD_REQUEST, self.to_string(), None),
            AppError::Storage(cause) => {
                tracing::error!(error = %cause, "Storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage operation failed".to_string(),
                    None,
                )
            }
            AppError::Upstream {
                status,
                message,
                body,
            } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
                Some(body.clone()),
            ),
            AppError::MissingField(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            AppError::Request(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
            AppError::InvalidJson(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string(), None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
