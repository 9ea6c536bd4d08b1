//! GraphQL proxy and question-answering handlers

use crate::api::utils::JsonBody;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

/// Body of `/api/get_full_response`
#[derive(Deserialize)]
pub struct FullResponseRequest {
    /// Natural-language question
    #[serde(default)]
    pub question: Option<String>,
}

/// POST /api/codesmell - Forward any GraphQL payload, keeping the upstream status
pub async fn proxy(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (status, body) = state.graphql.forward(&payload).await?;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(body)))
}

/// POST /api/get_full_response - Run a question through the SQL/chart workflow
pub async fn full_response(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<FullResponseRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let question = request.question.unwrap_or_default();
    let outcome = state.ask.run(&question).await?;

    let status = outcome.status_code();
    tracing::info!(status_code = status.as_u16(), "Question workflow finished");
    Ok((status, Json(outcome.into_payload())))
}
