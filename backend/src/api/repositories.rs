//! Repository indexing and query handlers
//!
//! `/api/repositories`, `/api/index_repository` and `/api/query` sit behind
//! the `API-Key` middleware; `/api/repositoryanalysis` and `/api/filetree`
//! do not.

use crate::api::utils::{required, JsonBody, QueryParams};
use crate::error::AppError;
use crate::extract::extract_query_result;
use crate::state::SharedState;
use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Role used when a query request does not name one
pub const DEFAULT_ROLE: &str = "user";

/// Body of `/api/repositories`
#[derive(Deserialize)]
pub struct IndexRepositoryRequest {
    /// Repository in `owner/name` form
    pub repository: Option<String>,
    /// Branch to index
    pub branch: Option<String>,
}

/// Query string of `/api/index_repository`
#[derive(Deserialize)]
pub struct IndexStatusQuery {
    /// Id returned when the repository was submitted
    pub repository_id: Option<String>,
}

/// Body of `/api/query`
#[derive(Deserialize)]
pub struct RepositoryQueryRequest {
    /// Repository to ask about
    pub repository: Option<String>,
    /// The question
    pub query: Option<String>,
    /// Chat role of the question
    pub role: Option<String>,
}

/// Body of `/api/repositoryanalysis`
#[derive(Deserialize)]
pub struct AnalysisRequest {
    /// Repository to index and ask about
    pub repository: Option<String>,
    /// Branch to index
    pub branch: Option<String>,
    /// Chat role of the question
    pub role: Option<String>,
    /// The question
    pub query: Option<String>,
}

/// Upstream payload wrapped with a message
#[derive(Serialize)]
pub struct DataResponse {
    /// Human-readable message
    pub message: String,
    /// Upstream JSON
    pub data: Value,
}

/// Extracted answer to a repository question
#[derive(Serialize)]
pub struct QueryResponse {
    /// Human-readable message
    pub message: String,
    /// Sources cited by the answer
    pub source: Vec<Value>,
    /// Answer text
    pub content: String,
}

impl QueryResponse {
    fn from_raw(raw: &str) -> Self {
        let extracted = extract_query_result(raw);
        Self {
            message: "Repository fetched successfully!".to_string(),
            source: extracted.sources,
            content: extracted.content,
        }
    }
}

/// POST /api/repositories - Submit a repository for indexing
pub async fn index_repository(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<IndexRepositoryRequest>,
) -> Result<Json<DataResponse>, AppError> {
    let repository = required(&request.repository, "repository")?;
    let branch = required(&request.branch, "branch")?;

    let data = state
        .index
        .submit_repository(repository, branch)
        .await
        .map_err(|e| e.upstream_context("Failed to index repository"))?;

    Ok(Json(DataResponse {
        message: "Repository indexed successfully!".to_string(),
        data,
    }))
}

/// GET /api/index_repository?repository_id= - Indexing status
pub async fn indexing_status(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<IndexStatusQuery>,
) -> Result<Json<DataResponse>, AppError> {
    let repository_id = required(&query.repository_id, "repository_id")?;

    let data = state
        .index
        .repository_status(repository_id)
        .await
        .map_err(|e| e.upstream_context("Failed to fetch repository"))?;

    Ok(Json(DataResponse {
        message: "Repository fetched successfully!".to_string(),
        data,
    }))
}

/// POST /api/query - Ask a question about an indexed repository
pub async fn query_repository(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<RepositoryQueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let repository = required(&request.repository, "repository")?;
    let query = required(&request.query, "query")?;
    let role = request.role.as_deref().unwrap_or(DEFAULT_ROLE);

    let raw = state
        .index
        .query(role, query, repository)
        .await
        .map_err(|e| e.upstream_context("Failed to query repository"))?;

    Ok(Json(QueryResponse::from_raw(&raw)))
}

/// POST /api/repositoryanalysis - Index, check status, then query in one call
///
/// The status lookup is informational only; its failure is logged and the
/// query still runs.
pub async fn repository_analysis(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<AnalysisRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let repository = required(&request.repository, "repository")?;
    let branch = required(&request.branch, "branch")?;
    let query = required(&request.query, "query")?;
    let role = request.role.as_deref().unwrap_or(DEFAULT_ROLE);

    let submitted = state
        .index
        .submit_repository(repository, branch)
        .await
        .map_err(|e| e.upstream_context("Failed to get repository"))?;

    let repository_id = match submitted.pointer("/data/repository_id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(AppError::Upstream {
                status: 400,
                message: "Repository ID not found".to_string(),
                body: submitted,
            })
        }
    };
    tracing::info!(repository_id = %repository_id, "Repository submitted for analysis");

    match state.index.repository_status(&repository_id).await {
        Ok(status) => tracing::debug!(repository_id = %repository_id, status = %status, "Repository details"),
        Err(e) => tracing::warn!(repository_id = %repository_id, error = %e, "Repository details unavailable"),
    }

    let raw = state
        .index
        .query(role, query, repository)
        .await
        .map_err(|e| e.upstream_context("Failed to query repository"))?;

    Ok(Json(QueryResponse::from_raw(&raw)))
}

/// POST /api/filetree - Placeholder file tree for the repository browser
pub async fn file_tree() -> Json<Value> {
    Json(json!({
        "tree": [
            {
                "type": "folder",
                "name": "src",
                "children": [
                    {"type": "file", "name": "index.js"},
                    {"type": "file", "name": "App.js"},
                    {
                        "type": "folder",
                        "name": "components",
                        "children": [
                            {"type": "file", "name": "Dashboard.js"},
                            {"type": "file", "name": "Header.js"}
                        ]
                    }
                ]
            },
            {"type": "file", "name": "package.json"},
            {"type": "file", "name": "README.md"}
        ]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_from_raw() {
        let raw = r#"{"sources": ["src/lib.rs"]} data: {"content": "Uses"} data: {"content": "axum"}"#;
        let response = QueryResponse::from_raw(raw);
        assert_eq!(response.source, vec![json!("src/lib.rs")]);
        assert_eq!(response.content, "Uses\n\naxum");
    }

    #[tokio::test]
    async fn test_file_tree_shape() {
        let Json(tree) = file_tree().await;
        let top = tree["tree"].as_array().unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0]["children"][2]["name"], "components");
    }
}
