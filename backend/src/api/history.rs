//! Question history handlers

use crate::api::utils::{JsonBody, QueryParams};
use crate::error::AppError;
use crate::state::SharedState;
use crate::store::{NewQuestion, QuestionRecord};
use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};

/// Response to a stored question
#[derive(Serialize)]
pub struct AddQuestionResponse {
    /// Human-readable status
    pub status: String,
    /// Id of the stored row
    pub id: i64,
}

/// Query string of `/get_questions`
#[derive(Deserialize)]
pub struct QuestionsQuery {
    /// Owner of the history
    pub user_id: i64,
}

/// POST /add_question - Store a question in a user's history
pub async fn add_question(
    State(state): State<SharedState>,
    JsonBody(question): JsonBody<NewQuestion>,
) -> Result<Json<AddQuestionResponse>, AppError> {
    if question.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".to_string()));
    }

    let id = state.db.add_question(&question).await?;
    tracing::debug!(id, user_id = question.user_id, "Question stored");

    Ok(Json(AddQuestionResponse {
        status: "Message added successfully".to_string(),
        id,
    }))
}

/// GET /get_questions?user_id= - List a user's question history
pub async fn get_questions(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<QuestionsQuery>,
) -> Result<Json<Vec<QuestionRecord>>, AppError> {
    let questions = state.db.questions_for_user(query.user_id).await?;
    Ok(Json(questions))
}
