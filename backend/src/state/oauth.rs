//! Pending GitHub OAuth `state` values
//!
//! `/github/login` issues a random state; `/github/callback` must present one
//! that was issued and not yet used. Entries expire after [`STATE_TTL`].

use rand::RngCore;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long an issued state stays valid
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Set of issued, unused OAuth states
#[derive(Debug, Default)]
pub struct OAuthStates {
    pending: RwLock<HashMap<String, Instant>>,
}

impl OAuthStates {
    /// Issue a new random state (32 hex chars)
    pub async fn issue(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let state = hex::encode(bytes);

        let mut pending = self.pending.write().await;
        pending.retain(|_, issued| issued.elapsed() < STATE_TTL);
        pending.insert(state.clone(), Instant::now());
        state
    }

    /// Consume a state, returning whether it was issued and still valid
    pub async fn consume(&self, state: &str) -> bool {
        match self.pending.write().await.remove(state) {
            Some(issued) => issued.elapsed() < STATE_TTL,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_is_single_use() {
        let states = OAuthStates::default();
        let state = states.issue().await;

        assert_eq!(state.len(), 32);
        assert!(states.consume(&state).await);
        assert!(!states.consume(&state).await);
        assert!(states.pending.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_state_is_rejected() {
        let states = OAuthStates::default();
        states.issue().await;

        assert!(!states.consume("random_state_string").await);
        assert_eq!(states.pending.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_states_are_distinct() {
        let states = OAuthStates::default();
        let a = states.issue().await;
        let b = states.issue().await;
        assert_ne!(a, b);
    }
}
