//! Typed views over GraphQL workflow responses
//!
//! The workflow forwards upstream payloads verbatim, so these views only
//! read the fields that drive the next step.

use serde::Deserialize;
use serde_json::Value;

/// Status of a remote asking task, answer, or chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Work completed
    Finished,
    /// Work failed
    Failed,
    /// Work was cancelled
    Cancelled,
    /// Answer text is being streamed
    Streaming,
    /// Any other in-progress status (UNDERSTANDING, SEARCHING, ...)
    Pending(String),
    /// The status field was absent
    Missing,
}

impl RemoteStatus {
    /// Parse an optional status string
    pub fn parse(status: Option<&str>) -> Self {
        match status {
            Some("FINISHED") => RemoteStatus::Finished,
            Some("FAILED") => RemoteStatus::Failed,
            Some("CANCELLED") => RemoteStatus::Cancelled,
            Some("STREAMING") => RemoteStatus::Streaming,
            Some(other) => RemoteStatus::Pending(other.to_string()),
            None => RemoteStatus::Missing,
        }
    }

    /// Whether the status ends the job unsuccessfully
    pub fn is_failure(&self) -> bool {
        matches!(self, RemoteStatus::Failed | RemoteStatus::Cancelled)
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteStatus::Finished => f.write_str("FINISHED"),
            RemoteStatus::Failed => f.write_str("FAILED"),
            RemoteStatus::Cancelled => f.write_str("CANCELLED"),
            RemoteStatus::Streaming => f.write_str("STREAMING"),
            RemoteStatus::Pending(s) => f.write_str(s),
            RemoteStatus::Missing => f.write_str("<missing>"),
        }
    }
}

/// One SQL translation offered by an asking task
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    /// Generated SQL
    #[serde(default)]
    pub sql: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAskingTask {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

/// The parts of `data.askingTask` the workflow reads
#[derive(Debug, Clone)]
pub struct AskingTaskView {
    /// Current task status
    pub status: RemoteStatus,
    /// SQL candidates (empty when absent)
    pub candidates: Vec<Candidate>,
}

impl AskingTaskView {
    /// Read the view from a full `AskingTask` response
    pub fn from_payload(payload: &Value) -> Self {
        let raw = payload
            .pointer("/data/askingTask")
            .and_then(|task| serde_json::from_value::<RawAskingTask>(task.clone()).ok());

        match raw {
            Some(raw) => Self {
                status: RemoteStatus::parse(raw.status.as_deref()),
                candidates: raw.candidates.unwrap_or_default(),
            },
            None => Self {
                status: RemoteStatus::Missing,
                candidates: Vec::new(),
            },
        }
    }
}

/// Answer and chart statuses of a thread response
#[derive(Debug, Clone)]
pub struct ThreadResponseView {
    /// `answerDetail.status`
    pub answer: RemoteStatus,
    /// `chartDetail.status`
    pub chart: RemoteStatus,
}

impl ThreadResponseView {
    /// Read the view from the response object under `data.<field>`
    pub fn from_payload(payload: &Value, field: &str) -> Self {
        let response = payload.get("data").and_then(|data| data.get(field));
        let status_at = |detail: &str| {
            RemoteStatus::parse(
                response
                    .and_then(|r| r.get(detail))
                    .and_then(|d| d.get("status"))
                    .and_then(Value::as_str),
            )
        };
        Self {
            answer: status_at("answerDetail"),
            chart: status_at("chartDetail"),
        }
    }
}

/// Read an integer id at a JSON pointer, accepting numeric strings
pub fn id_at(payload: &Value, pointer: &str) -> Option<i64> {
    match payload.pointer(pointer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read an opaque id at a JSON pointer as a string
pub fn opaque_id_at(payload: &Value, pointer: &str) -> Option<String> {
    match payload.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
