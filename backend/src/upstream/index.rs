//! Repository-indexing service client
//!
//! Submits repositories for indexing, reads indexing status, and runs
//! chat-style queries against indexed repositories.

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::upstream::read_success_body;
use anyhow::anyhow;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

const SERVICE: &str = "Repository indexing service";

/// Client for the repository-indexing REST API
#[derive(Clone)]
pub struct IndexClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct IndexRequest<'a> {
    repository: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct QueryMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct QueryRepository<'a> {
    repository: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    messages: Vec<QueryMessage<'a>>,
    repositories: Vec<QueryRepository<'a>>,
    stream: bool,
}

impl IndexClient {
    /// Create a client from upstream configuration
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        let mut base_url = config.index_base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http,
            base_url,
            api_key: config.index_api_key.clone(),
        }
    }

    /// Submit a repository and branch for indexing
    ///
    /// # Returns
    /// * `Ok(Value)` - Upstream JSON, carrying `data.repository_id`
    /// * `Err(AppError::Upstream)` - Upstream rejected the request
    pub async fn submit_repository(&self, repository: &str, branch: &str) -> Result<Value, AppError> {
        let url = format!("{}repositories", self.base_url);
        tracing::debug!(url = %url, repository = %repository, branch = %branch, "Submitting repository for indexing");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&IndexRequest { repository, branch })
            .send()
            .await?;

        let body = read_success_body(response, SERVICE).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch indexing status for a repository id
    ///
    /// The id is sent as one percent-encoded path segment; ids that would
    /// leave `repositories/` (`.`, `..`, anything with `/`) are rejected.
    pub async fn repository_status(&self, repository_id: &str) -> Result<Value, AppError> {
        let url = self.repository_url(repository_id)?;
        tracing::debug!(url = %url, "Fetching repository indexing status");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .send()
            .await?;

        let body = read_success_body(response, SERVICE).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn repository_url(&self, repository_id: &str) -> Result<Url, AppError> {
        let id = repository_id.trim();
        if id.is_empty() || id == "." || id == ".." || id.contains('/') || id.contains('\\') {
            return Err(AppError::Validation(format!(
                "Invalid repository_id: {:?}",
                repository_id
            )));
        }

        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join("repositories/"))
            .map_err(|e| AppError::Internal(anyhow!("Invalid indexing service URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(anyhow!("Indexing service URL cannot take a path")))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Ask a question about an indexed repository
    ///
    /// Returns the raw response text; it is not plain JSON, see
    /// [`crate::extract`].
    pub async fn query(&self, role: &str, query: &str, repository: &str) -> Result<String, AppError> {
        let url = format!("{}query", self.base_url);
        let request = QueryRequest {
            messages: vec![QueryMessage {
                role,
                content: query,
            }],
            repositories: vec![QueryRepository { repository }],
            stream: false,
        };
        tracing::debug!(url = %url, repository = %repository, query_len = query.len(), "Querying repository");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_success_body(response, SERVICE).await?;
        tracing::debug!(response_len = body.len(), "Received repository query response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> IndexClient {
        let config = UpstreamConfig {
            index_base_url: server.url(),
            index_api_key: "Bearer test-key".to_string(),
            ..UpstreamConfig::default()
        };
        IndexClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_submit_repository_sends_auth_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::Json(json!({
                "repository": "microsoft/vscode",
                "branch": "main"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"repository_id": "abc"}}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .submit_repository("microsoft/vscode", "main")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["data"]["repository_id"], "abc");
    }

    #[tokio::test]
    async fn test_repository_status_error_keeps_upstream_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/missing")
            .with_status(404)
            .with_body(r#"{"detail": "Repository not found"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .repository_status("missing")
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            AppError::Upstream { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body["detail"], "Repository not found");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repository_status_rejects_path_escape() {
        let mut server = Server::new_async().await;
        let escaped = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let client = client_for(&server);

        for id in ["../query", "..", "a/b", " "] {
            let err = client.repository_status(id).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{} was not rejected", id);
        }
        escaped.assert_async().await;
    }

    #[tokio::test]
    async fn test_repository_status_encodes_id_as_one_segment() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/a%3Fb%23c")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"status": "indexing"}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .repository_status("a?b#c")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["status"], "indexing");
    }

    #[tokio::test]
    async fn test_query_returns_raw_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(json!({
                "messages": [{"role": "user", "content": "How are errors handled?"}],
                "repositories": [{"repository": "microsoft/vscode"}],
                "stream": false
            })))
            .with_status(200)
            .with_body("data: {\"content\": \"Through Result\"}\n\n")
            .create_async()
            .await;

        let body = client_for(&server)
            .query("user", "How are errors handled?", "microsoft/vscode")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(body.contains("Through Result"));
    }
}
