//! GitHub OAuth and repository listing handlers

use crate::api::utils::QueryParams;
use crate::error::AppError;
use crate::state::SharedState;
use crate::upstream::github::token_from_authorization;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{Json, Redirect},
};
use serde::Deserialize;
use serde_json::Value;

/// Query string GitHub sends to the callback
#[derive(Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// State issued by `/github/login`
    pub state: Option<String>,
}

/// GET /github/login - Redirect the browser to GitHub's authorize page
pub async fn login(State(state): State<SharedState>) -> Result<Redirect, AppError> {
    let oauth_state = state.oauth_states.issue().await;
    let url = state.github.authorize_url(&oauth_state)?;
    tracing::debug!("Redirecting to GitHub authorization");
    Ok(Redirect::to(&url))
}

/// GET /github/callback - Exchange the code and hand the token to the frontend
pub async fn callback(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let oauth_state = query.state.unwrap_or_default();
    if !state.oauth_states.consume(&oauth_state).await {
        tracing::warn!("GitHub callback with unknown or expired state");
        return Err(AppError::Unauthorized("Invalid OAuth state".to_string()));
    }

    let code = match query.code {
        Some(code) if !code.is_empty() => code,
        _ => return Err(AppError::Validation("Authorization code is missing".to_string())),
    };

    let access_token = state.github.exchange_code(&code, &oauth_state).await?;
    let username = state
        .github
        .user_login(&access_token)
        .await?
        .unwrap_or_default();
    tracing::info!(username = %username, "GitHub login completed");

    let url = state.github.frontend_redirect(&access_token, &username)?;
    Ok(Redirect::to(&url))
}

/// GET /github/repos - List repositories for the bearer GitHub token
pub async fn repos(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(token_from_authorization)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Access token is missing".to_string()))?;

    let repos = state.github.list_repos(token).await?;
    Ok(Json(repos))
}
