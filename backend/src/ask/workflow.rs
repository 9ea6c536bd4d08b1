//! Question-answering workflow
//!
//! Drives one question through the remote service:
//!
//! 1. `CreateAskingTask`, keep the task id
//! 2. poll `AskingTask` until FINISHED / FAILED / CANCELLED
//! 3. `CreateThread` with the first candidate's SQL
//! 4. `CreateThreadResponse`, `GenerateThreadResponseAnswer`,
//!    `GenerateThreadResponseChart`
//! 5. poll `ThreadResponse` until answer and chart are both FINISHED, or
//!    either one FAILED / CANCELLED
//!
//! Both polling loops wait with `tokio::time::sleep` and stop after
//! `PollPolicy::max_attempts`. The workflow holds no state beyond its local
//! ids; dropping the future (e.g. the client disconnects) abandons it.

use crate::ask::backend::AskBackend;
use crate::ask::types::{id_at, opaque_id_at, AskingTaskView, RemoteStatus, ThreadResponseView};
use crate::config::PollingConfig;
use crate::error::AppError;
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed-interval polling bounds
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Wait between polls
    pub interval: Duration,
    /// Polls per loop before giving up
    pub max_attempts: u32,
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// How a workflow run ended
///
/// Every variant carries the last upstream payload, forwarded verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// Answer and chart both finished
    Answered(Value),
    /// The asking task itself failed or was cancelled
    TaskEnded(Value),
    /// The asking task finished without any SQL candidate
    NoCandidates(Value),
    /// Answer or chart generation failed or was cancelled
    ResponseFailed(Value),
}

impl AskOutcome {
    /// HTTP status the outcome is reported with
    ///
    /// A failed or cancelled asking task is passed through as a normal result.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AskOutcome::Answered(_) | AskOutcome::TaskEnded(_) => StatusCode::OK,
            AskOutcome::NoCandidates(_) | AskOutcome::ResponseFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The upstream payload
    pub fn into_payload(self) -> Value {
        match self {
            AskOutcome::Answered(v)
            | AskOutcome::TaskEnded(v)
            | AskOutcome::NoCandidates(v)
            | AskOutcome::ResponseFailed(v) => v,
        }
    }
}

/// Result of polling the asking task
enum TaskResult {
    Sql(String),
    Ended(Value),
    NoCandidates(Value),
}

/// Runs the question-answering workflow against an [`AskBackend`]
#[derive(Clone)]
pub struct AskWorkflow {
    backend: Arc<dyn AskBackend>,
    policy: PollPolicy,
}

impl AskWorkflow {
    /// Create a workflow over a backend with the given polling bounds
    pub fn new(backend: Arc<dyn AskBackend>, policy: PollPolicy) -> Self {
        Self { backend, policy }
    }

    /// Turn a question into a final answer payload
    ///
    /// # Errors
    /// * `AppError::Validation` - question is blank
    /// * `AppError::MissingField` - an id the next step needs is absent
    /// * `AppError::Timeout` - a polling loop ran out of attempts
    /// * transport and upstream errors from the backend, unretried
    pub async fn run(&self, question: &str) -> Result<AskOutcome, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question is missing".to_string()));
        }

        let created = self.backend.create_asking_task(question).await?;
        let task_id = opaque_id_at(&created, "/data/createAskingTask/id")
            .ok_or_else(|| AppError::MissingField("Task ID not found in response".to_string()))?;
        info!(task_id = %task_id, "Asking task created");

        let sql = match self.await_task(&task_id).await? {
            TaskResult::Sql(sql) => sql,
            TaskResult::Ended(payload) => return Ok(AskOutcome::TaskEnded(payload)),
            TaskResult::NoCandidates(payload) => return Ok(AskOutcome::NoCandidates(payload)),
        };

        let thread = self.backend.create_thread(question, &sql).await?;
        let thread_id = id_at(&thread, "/data/createThread/id").ok_or_else(|| {
            AppError::MissingField("Thread ID not found in createThread response".to_string())
        })?;
        debug!(thread_id, "Thread created");

        let created_response = self
            .backend
            .create_thread_response(thread_id, question, &sql)
            .await?;
        let response_id = id_at(&created_response, "/data/createThreadResponse/id").ok_or_else(
            || {
                AppError::MissingField(
                    "Response ID not found in createThreadResponse response".to_string(),
                )
            },
        )?;
        debug!(response_id, "Thread response created");

        let answer = self.backend.generate_answer(response_id).await?;
        let answer_status =
            ThreadResponseView::from_payload(&answer, "generateThreadResponseAnswer").answer;
        debug!(response_id, status = %answer_status, "Answer generation requested");

        let chart = self.backend.generate_chart(response_id).await?;
        let chart_status =
            ThreadResponseView::from_payload(&chart, "generateThreadResponseChart").chart;
        debug!(response_id, status = %chart_status, "Chart generation requested");

        self.await_response(response_id).await
    }

    async fn await_task(&self, task_id: &str) -> Result<TaskResult, AppError> {
        for attempt in 1..=self.policy.max_attempts {
            let payload = self.backend.asking_task(task_id).await?;
            let task = AskingTaskView::from_payload(&payload);
            debug!(task_id = %task_id, attempt, status = %task.status, "Polled asking task");

            match task.status {
                RemoteStatus::Finished => {
                    let Some(candidate) = task.candidates.first() else {
                        warn!(task_id = %task_id, "Asking task finished without candidates");
                        return Ok(TaskResult::NoCandidates(payload));
                    };
                    let sql = candidate.sql.clone().ok_or_else(|| {
                        AppError::MissingField("Candidate SQL not found in response".to_string())
                    })?;
                    return Ok(TaskResult::Sql(sql));
                }
                status if status.is_failure() => {
                    info!(task_id = %task_id, status = %status, "Asking task ended without an answer");
                    return Ok(TaskResult::Ended(payload));
                }
                _ => self.wait(attempt).await,
            }
        }

        Err(AppError::Timeout(format!(
            "asking task {} did not finish after {} polls",
            task_id, self.policy.max_attempts
        )))
    }

    async fn await_response(&self, response_id: i64) -> Result<AskOutcome, AppError> {
        for attempt in 1..=self.policy.max_attempts {
            let payload = self.backend.thread_response(response_id).await?;
            let view = ThreadResponseView::from_payload(&payload, "threadResponse");
            debug!(
                response_id,
                attempt,
                answer = %view.answer,
                chart = %view.chart,
                "Polled thread response"
            );

            if view.answer == RemoteStatus::Finished && view.chart == RemoteStatus::Finished {
                info!(response_id, "Answer and chart finished");
                return Ok(AskOutcome::Answered(payload));
            }
            if view.answer.is_failure() || view.chart.is_failure() {
                warn!(response_id, answer = %view.answer, chart = %view.chart, "Thread response failed");
                return Ok(AskOutcome::ResponseFailed(payload));
            }
            if view.answer == RemoteStatus::Streaming {
                match self.backend.streaming_answer(response_id).await {
                    Ok(streamed) => {
                        debug!(response_id, streamed_len = streamed.len(), "Streaming answer read")
                    }
                    Err(e) => warn!(response_id, error = %e, "Streaming answer unavailable, still polling"),
                }
            }
            self.wait(attempt).await;
        }

        Err(AppError::Timeout(format!(
            "thread response {} did not finish after {} polls",
            response_id, self.policy.max_attempts
        )))
    }

    async fn wait(&self, attempt: u32) {
        if attempt < self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
        }
    }
}
