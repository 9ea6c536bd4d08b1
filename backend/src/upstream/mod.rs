//! Upstream service clients
//!
//! Thin HTTP clients for the third-party services this backend fronts. All
//! clients share one `reqwest::Client` (connection pooling) and take their
//! base URLs from configuration, so tests can point them at a mock server.

pub mod github;
pub mod graphql;
pub mod index;

use crate::config::Config;
use crate::error::AppError;
use serde_json::Value;
use std::time::Duration;

pub use github::GithubClient;
pub use graphql::{GraphqlClient, GraphqlRequest};
pub use index::IndexClient;

/// Build the shared outbound HTTP client
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.request_timeout_secs))
        .user_agent(concat!("codesense-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
}

/// Parse a body as JSON, keeping it as a JSON string when it is not JSON
pub(crate) fn json_or_text(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Turn a non-success response into `AppError::Upstream`, otherwise return its body
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    service: &str,
) -> Result<String, AppError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            service = service,
            status_code = status.as_u16(),
            error_body = %body,
            "Upstream returned error status"
        );
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message: format!("{} returned error status {}", service, status.as_u16()),
            body: json_or_text(&body),
        });
    }

    Ok(body)
}
