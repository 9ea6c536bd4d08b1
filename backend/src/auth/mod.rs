//! Password authentication and session tokens
//!
//! A successful login mints a new UUID token and stores it as the user's API
//! key, so each user holds at most one valid token at a time.

pub mod password;

use crate::error::AppError;
use crate::store::UserDb;
use serde::Serialize;
use uuid::Uuid;

/// Message returned for any failed login
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    /// Id of the authenticated user
    pub user_id: i64,
    /// Login name
    pub username: String,
    /// Freshly minted session token
    pub api_key: String,
}

/// Register a new user
///
/// # Errors
/// * `AppError::Validation` if username or password is blank
/// * `AppError::RegistrationFailed` if the username is taken
pub async fn register(
    db: &UserDb,
    username: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<i64, AppError> {
    let username = require_credentials(username, password)?;
    let hash = password::hash_password(password, bcrypt_cost).await?;
    db.create_user(username, &hash).await
}

/// Verify credentials and rotate the user's session token
///
/// Unknown usernames and wrong passwords produce the same error.
pub async fn login(db: &UserDb, username: &str, password: &str) -> Result<LoginSession, AppError> {
    let username = require_credentials(username, password)?;

    let user = match db.find_by_username(username).await? {
        Some(user) if password::verify_password(password, &user.password).await => user,
        _ => {
            tracing::info!(username = %username, "Login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let api_key = Uuid::new_v4().to_string();
    db.set_api_key(user.id, &api_key).await?;
    tracing::info!(user_id = user.id, "Login successful");

    Ok(LoginSession {
        user_id: user.id,
        username: user.username,
        api_key,
    })
}

/// Whether a session token belongs to some user
///
/// Storage failures count as invalid.
pub async fn validate_api_key(db: &UserDb, api_key: &str) -> bool {
    if api_key.is_empty() {
        return false;
    }
    match db.find_user_id_by_api_key(api_key).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, "API key lookup failed, treating key as invalid");
            false
        }
    }
}

fn require_credentials<'a>(username: &'a str, password: &str) -> Result<&'a str, AppError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    Ok(username)
}
