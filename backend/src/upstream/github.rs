//! GitHub OAuth and REST client
//!
//! Covers the authorization-code flow (authorize URL, code exchange), the
//! profile lookup used to name the user, and repository listing.

use crate::config::GithubConfig;
use crate::error::AppError;
use crate::upstream::{json_or_text, read_success_body};
use anyhow::anyhow;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

const SERVICE: &str = "GitHub";

#[derive(Deserialize)]
struct GithubUser {
    login: Option<String>,
}

/// Client for GitHub OAuth and the REST API
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    /// Create a client from GitHub configuration
    pub fn new(http: reqwest::Client, config: GithubConfig) -> Self {
        Self { http, config }
    }

    /// Browser URL that starts the OAuth flow
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.config.oauth_base_url),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(anyhow!("Invalid GitHub authorize URL: {}", e)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    /// * `AppError::Upstream` (status 400) if GitHub answers without a token
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<String, AppError> {
        let url = format!("{}/login/oauth/access_token", self.config.oauth_base_url);
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
        ];

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;
        let body = read_success_body(response, SERVICE)
            .await
            .map_err(|e| e.upstream_context("Error connecting to GitHub"))?;

        let token_json = json_or_text(&body);
        match token_json.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(AppError::Upstream {
                status: 400,
                message: "Failed to obtain access token".to_string(),
                body: token_json,
            }),
        }
    }

    /// Login name of the token's owner, if GitHub reports one
    pub async fn user_login(&self, access_token: &str) -> Result<Option<String>, AppError> {
        let response = self
            .http
            .get(format!("{}/user", self.config.api_base_url))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", access_token))
            .send()
            .await?;
        let body = read_success_body(response, SERVICE).await?;
        let user: GithubUser = serde_json::from_str(&body)?;
        Ok(user.login)
    }

    /// Repositories visible to the token's owner, as returned by GitHub
    pub async fn list_repos(&self, access_token: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(format!("{}/user/repos", self.config.api_base_url))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", access_token))
            .send()
            .await?;
        let body = read_success_body(response, SERVICE)
            .await
            .map_err(|e| e.upstream_context("Failed to fetch repositories"))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Frontend URL that receives the GitHub credentials after login
    pub fn frontend_redirect(&self, access_token: &str, username: &str) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &self.config.frontend_callback_url,
            &[
                ("access_token", access_token),
                ("username", username),
                ("authType", "github"),
            ],
        )
        .map_err(|e| AppError::Internal(anyhow!("Invalid frontend callback URL: {}", e)))?;
        Ok(url.into())
    }
}

/// Pull the token out of an `Authorization` header value
///
/// Accepts `Bearer <token>` (any case) and falls back to the raw value.
pub fn token_from_authorization(header: &str) -> &str {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => token,
        _ => header.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> GithubClient {
        let config = GithubConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            oauth_base_url: server.url(),
            api_base_url: server.url(),
            ..GithubConfig::default()
        };
        GithubClient::new(reqwest::Client::new(), config)
    }

    #[test]
    fn test_authorize_url_carries_state_and_scope() {
        let client = GithubClient::new(
            reqwest::Client::new(),
            GithubConfig {
                client_id: "abc".to_string(),
                ..GithubConfig::default()
            },
        );
        let url = Url::parse(&client.authorize_url("xyz").unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/login/oauth/authorize");
        assert!(pairs.contains(&("client_id".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "repo".to_string())));
        assert!(pairs.contains(&("state".to_string(), "xyz".to_string())));
    }

    #[test]
    fn test_token_from_authorization() {
        assert_eq!(token_from_authorization("Bearer gho_123"), "gho_123");
        assert_eq!(token_from_authorization("bearer gho_123"), "gho_123");
        assert_eq!(token_from_authorization("gho_123"), "gho_123");
        assert_eq!(token_from_authorization("token gho_123"), "token gho_123");
    }

    #[test]
    fn test_frontend_redirect_encodes_values() {
        let client = GithubClient::new(reqwest::Client::new(), GithubConfig::default());
        let url = client.frontend_redirect("gho_1", "octo cat").unwrap();
        assert!(url.starts_with("http://localhost:5173/auth/github/callback?"));
        assert!(url.contains("username=octo+cat"));
        assert!(url.contains("authType=github"));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/login/oauth/access_token")
            .match_header("accept", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "the-code".into()),
                Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "gho_abc", "token_type": "bearer"}"#)
            .create_async()
            .await;

        let token = client_for(&server)
            .exchange_code("the-code", "state")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token, "gho_abc");
    }

    #[tokio::test]
    async fn test_exchange_code_without_token_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_body(r#"{"error": "bad_verification_code"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .exchange_code("stale", "state")
            .await
            .unwrap_err();

        match err {
            AppError::Upstream { status, message, body } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Failed to obtain access token");
                assert_eq!(body, json!({"error": "bad_verification_code"}));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_repos_uses_token_scheme() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/user/repos")
            .match_header("authorization", "token gho_abc")
            .with_status(200)
            .with_body(r#"[{"full_name": "octo/hello"}]"#)
            .create_async()
            .await;

        let repos = client_for(&server).list_repos("gho_abc").await.unwrap();

        mock.assert_async().await;
        assert_eq!(repos[0]["full_name"], "octo/hello");
    }

    #[tokio::test]
    async fn test_list_repos_forwards_failure_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/user/repos")
            .with_status(401)
            .with_body("Bad credentials")
            .create_async()
            .await;

        let err = client_for(&server).list_repos("expired").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 401, .. }));
    }
}
