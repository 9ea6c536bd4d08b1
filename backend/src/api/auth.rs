//! Registration and login handlers

use crate::api::utils::JsonBody;
use crate::auth;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

/// Body of `/register` and `/login`
#[derive(Deserialize)]
pub struct CredentialsRequest {
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Plain password
    #[serde(default)]
    pub password: String,
}

/// Registration response
#[derive(Serialize)]
pub struct RegisterResponse {
    /// Human-readable message
    pub message: String,
    /// Id of the new user
    pub user_id: i64,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    /// Human-readable message
    pub message: String,
    /// Login name
    pub username: String,
    /// Session token to send as `API-Key`
    pub api_key: String,
    /// Id of the authenticated user
    pub user_id: i64,
}

/// POST /register - Create a user
pub async fn register(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user_id = auth::register(
        &state.db,
        &request.username,
        &request.password,
        state.config.auth.bcrypt_cost,
    )
    .await?;
    tracing::info!(user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully!".to_string(),
            user_id,
        }),
    ))
}

/// POST /login - Verify credentials and issue a fresh API key
pub async fn login(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = auth::login(&state.db, &request.username, &request.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful!".to_string(),
        username: session.username,
        api_key: session.api_key,
        user_id: session.user_id,
    }))
}
