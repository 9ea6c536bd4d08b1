//! Shared handler helpers
//!
//! The `API-Key` middleware, body and query extractors that reject with
//! [`AppError`], and small request validators.

use crate::auth;
use crate::error::AppError;
use crate::state::SharedState;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Json,
};

/// Header carrying the session token issued at login
pub const API_KEY_HEADER: &str = "API-Key";

/// Reject requests without a valid `API-Key` header
///
/// A missing header, an unknown key, and a storage failure all yield
/// 401 "Invalid API key".
pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if !auth::validate_api_key(&state.db, api_key).await {
        tracing::info!(path = %request.uri().path(), "Rejected request with invalid API key");
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }

    Ok(next.run(request).await)
}

/// JSON body extractor; a missing content type or an unreadable body is
/// `AppError::Validation`
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Rejected request body");
                Err(AppError::Validation(rejection.body_text()))
            }
        }
    }
}

/// Query string extractor rejecting with `AppError::Validation`
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    Query<T>: FromRequestParts<S, Rejection = axum::extract::rejection::QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Return the trimmed value of a required string field
///
/// # Errors
/// * `AppError::Validation` naming the field when it is absent or blank
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_accepts_value() {
        let value = Some("  acme/widgets ".to_string());
        assert_eq!(required(&value, "repository").unwrap(), "acme/widgets");
    }

    #[test]
    fn test_required_rejects_blank_and_missing() {
        let err = required(&Some("   ".to_string()), "branch").unwrap_err();
        assert_eq!(err.to_string(), "branch is required");
        assert!(required(&None, "query").is_err());
    }
}
