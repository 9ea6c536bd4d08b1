//! Remote operations used by the question-answering workflow
//!
//! [`AskBackend`] is the seam between the workflow state machine and the
//! GraphQL transport, so the workflow can be driven by test doubles.

use crate::ask::documents;
use crate::error::AppError;
use crate::upstream::GraphqlClient;
use async_trait::async_trait;
use serde_json::Value;

/// The remote calls the workflow issues, each returning the raw payload
#[async_trait]
pub trait AskBackend: Send + Sync {
    /// `CreateAskingTask`
    async fn create_asking_task(&self, question: &str) -> Result<Value, AppError>;

    /// `AskingTask`
    async fn asking_task(&self, task_id: &str) -> Result<Value, AppError>;

    /// `CreateThread`
    async fn create_thread(&self, question: &str, sql: &str) -> Result<Value, AppError>;

    /// `CreateThreadResponse`
    async fn create_thread_response(
        &self,
        thread_id: i64,
        question: &str,
        sql: &str,
    ) -> Result<Value, AppError>;

    /// `GenerateThreadResponseAnswer`
    async fn generate_answer(&self, response_id: i64) -> Result<Value, AppError>;

    /// `GenerateThreadResponseChart`
    async fn generate_chart(&self, response_id: i64) -> Result<Value, AppError>;

    /// `ThreadResponse`
    async fn thread_response(&self, response_id: i64) -> Result<Value, AppError>;

    /// Streaming-answer endpoint, drained to text
    async fn streaming_answer(&self, response_id: i64) -> Result<String, AppError>;
}

#[async_trait]
impl AskBackend for GraphqlClient {
    async fn create_asking_task(&self, question: &str) -> Result<Value, AppError> {
        self.execute(&documents::create_asking_task(question)).await
    }

    async fn asking_task(&self, task_id: &str) -> Result<Value, AppError> {
        self.execute(&documents::asking_task(task_id)).await
    }

    async fn create_thread(&self, question: &str, sql: &str) -> Result<Value, AppError> {
        self.execute(&documents::create_thread(question, sql)).await
    }

    async fn create_thread_response(
        &self,
        thread_id: i64,
        question: &str,
        sql: &str,
    ) -> Result<Value, AppError> {
        self.execute(&documents::create_thread_response(thread_id, question, sql))
            .await
    }

    async fn generate_answer(&self, response_id: i64) -> Result<Value, AppError> {
        self.execute(&documents::generate_answer(response_id)).await
    }

    async fn generate_chart(&self, response_id: i64) -> Result<Value, AppError> {
        self.execute(&documents::generate_chart(response_id)).await
    }

    async fn thread_response(&self, response_id: i64) -> Result<Value, AppError> {
        self.execute(&documents::thread_response(response_id)).await
    }

    async fn streaming_answer(&self, response_id: i64) -> Result<String, AppError> {
        GraphqlClient::streaming_answer(self, response_id).await
    }
}
