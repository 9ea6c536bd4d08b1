//! bcrypt password hashing
//!
//! Hashing and verification are CPU-bound and run on the blocking pool.

use crate::error::AppError;
use anyhow::anyhow;

/// Lowest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Hash a password with a fresh salt at the given bcrypt cost
///
/// # Errors
/// * `AppError::Internal` if the cost is out of range or the task panics
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow!("Password hashing failed: {}", e)))
}

/// Check a password against a stored bcrypt hash
///
/// Malformed hashes never verify.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let password = password.to_owned();
    let stored = stored.to_owned();
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_verifies() {
        let hash = hash_password("hunter2", MIN_COST).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter2", &hash).await);
        assert!(!verify_password("hunter3", &hash).await);
    }

    #[tokio::test]
    async fn test_same_password_gets_different_salts() {
        let a = hash_password("hunter2", MIN_COST).await.unwrap();
        let b = hash_password("hunter2", MIN_COST).await.unwrap();
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a).await);
        assert!(verify_password("hunter2", &b).await);
    }

    #[tokio::test]
    async fn test_hashes_from_other_bcrypt_writers_verify() {
        let stored = bcrypt::hash_with_result("hunter2", MIN_COST)
            .unwrap()
            .format_for_version(bcrypt::Version::TwoB);
        assert!(stored.starts_with("$2b$04$"));
        assert!(verify_password("hunter2", &stored).await);
    }

    #[tokio::test]
    async fn test_malformed_hashes_never_verify() {
        for stored in ["", "plain", "sha256$00$00", "$2b$04$short"] {
            assert!(!verify_password("hunter2", stored).await, "{:?}", stored);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_cost_is_an_error() {
        let err = hash_password("hunter2", 3).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
