//! GraphQL service client
//!
//! Posts `{operationName, variables, query}` documents to the
//! question-answering service and reads its streaming-answer endpoint.

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::upstream::{json_or_text, read_success_body};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;

const SERVICE: &str = "GraphQL service";

/// One GraphQL operation as sent on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    /// Name of the operation inside `query`
    pub operation_name: &'static str,
    /// Operation variables
    pub variables: Value,
    /// GraphQL document
    pub query: &'static str,
}

/// Client for the question-answering GraphQL endpoint
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    url: String,
    streaming_answer_url: String,
}

impl GraphqlClient {
    /// Create a client from upstream configuration
    pub fn new(http: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            http,
            url: config.graphql_url.clone(),
            streaming_answer_url: config.streaming_answer_url.clone(),
        }
    }

    /// Run one operation and return the full JSON response
    ///
    /// GraphQL-level `errors` are logged but not treated as failures; callers
    /// read the fields they need from `data`.
    pub async fn execute(&self, request: &GraphqlRequest) -> Result<Value, AppError> {
        tracing::debug!(operation = request.operation_name, "Calling GraphQL service");

        let response = self.http.post(&self.url).json(request).send().await?;
        let body = read_success_body(response, SERVICE).await?;
        let json: Value = serde_json::from_str(&body)?;

        if let Some(errors) = json.get("errors") {
            tracing::warn!(
                operation = request.operation_name,
                errors = %errors,
                "GraphQL response carries errors"
            );
        }

        Ok(json)
    }

    /// Forward an arbitrary payload, returning the upstream status and body as-is
    pub async fn forward(&self, payload: &Value) -> Result<(u16, Value), AppError> {
        let response = self.http.post(&self.url).json(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status_code = status, "GraphQL proxy call completed");
        Ok((status, json_or_text(&body)))
    }

    /// Drain the streaming answer for a thread response
    pub async fn streaming_answer(&self, response_id: i64) -> Result<String, AppError> {
        let response = self
            .http
            .get(&self.streaming_answer_url)
            .query(&[("responseId", response_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: "Streaming answer request failed".to_string(),
                body: json_or_text(&body),
            });
        }

        // A chunk can end inside a UTF-8 sequence; decode after the last one
        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
            chunks += 1;
        }
        tracing::trace!(response_id, chunks, "Streaming answer drained");

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> GraphqlClient {
        let config = UpstreamConfig {
            graphql_url: format!("{}/api/graphql", server.url()),
            streaming_answer_url: format!("{}/api/ask_task/streaming_answer", server.url()),
            ..UpstreamConfig::default()
        };
        GraphqlClient::new(reqwest::Client::new(), &config)
    }

    #[test]
    fn test_request_serializes_operation_name_in_camel_case() {
        let request = GraphqlRequest {
            operation_name: "AskingTask",
            variables: json!({"taskId": "t-1"}),
            query: "query AskingTask { x }",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operationName"], "AskingTask");
        assert_eq!(value["variables"]["taskId"], "t-1");
    }

    #[tokio::test]
    async fn test_execute_returns_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/graphql")
            .match_body(Matcher::PartialJson(json!({"operationName": "Ping"})))
            .with_status(200)
            .with_body(r#"{"data": {"ping": "pong"}}"#)
            .create_async()
            .await;

        let request = GraphqlRequest {
            operation_name: "Ping",
            variables: json!({}),
            query: "query Ping { ping }",
        };
        let result = client_for(&server).execute(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["data"]["ping"], "pong");
    }

    #[tokio::test]
    async fn test_execute_rejects_non_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let request = GraphqlRequest {
            operation_name: "Ping",
            variables: json!({}),
            query: "query Ping { ping }",
        };
        let err = client_for(&server).execute(&request).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_forward_keeps_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/graphql")
            .with_status(400)
            .with_body(r#"{"errors": [{"message": "bad query"}]}"#)
            .create_async()
            .await;

        let (status, body) = client_for(&server)
            .forward(&json!({"query": "{"}))
            .await
            .unwrap();
        assert_eq!(status, 400);
        assert_eq!(body["errors"][0]["message"], "bad query");
    }

    #[tokio::test]
    async fn test_streaming_answer_passes_response_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/ask_task/streaming_answer")
            .match_query(Matcher::UrlEncoded("responseId".into(), "7".into()))
            .with_status(200)
            .with_body("data: {\"message\": \"partial\"}\n\n")
            .create_async()
            .await;

        let text = client_for(&server).streaming_answer(7).await.unwrap();

        mock.assert_async().await;
        assert!(text.contains("partial"));
    }

    #[tokio::test]
    async fn test_streaming_answer_keeps_characters_split_across_chunks() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/ask_task/streaming_answer")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all("data: caf".as_bytes())?;
                w.write_all(&[0xC3])?;
                w.write_all(&[0xA9])?;
                w.write_all(" \u{2713}".as_bytes())
            })
            .create_async()
            .await;

        let text = client_for(&server).streaming_answer(7).await.unwrap();

        assert_eq!(text, "data: caf\u{e9} \u{2713}");
        assert!(!text.contains('\u{FFFD}'));
    }
}
