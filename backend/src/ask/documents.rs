//! GraphQL documents for the question-answering workflow
//!
//! Each builder returns a ready-to-send [`GraphqlRequest`]. Thread-response
//! operations share one set of fragments.

use crate::upstream::GraphqlRequest;
use serde_json::json;

macro_rules! common_error_fragment {
    () => {
        "
fragment CommonError on Error {
  code
  shortMessage
  message
  stacktrace
  __typename
}"
    };
}

macro_rules! thread_response_fragments {
    () => {
        concat!(
            "
fragment CommonResponse on ThreadResponse {
  id
  threadId
  question
  sql
  view {
    id
    name
    statement
    displayName
    __typename
  }
  breakdownDetail {
    ...CommonBreakdownDetail
    __typename
  }
  answerDetail {
    ...CommonAnswerDetail
    __typename
  }
  chartDetail {
    ...CommonChartDetail
    __typename
  }
  __typename
}

fragment CommonBreakdownDetail on ThreadResponseBreakdownDetail {
  queryId
  status
  description
  steps {
    summary
    sql
    cteName
    __typename
  }
  error {
    ...CommonError
    __typename
  }
  __typename
}
",
            common_error_fragment!(),
            "

fragment CommonAnswerDetail on ThreadResponseAnswerDetail {
  queryId
  status
  content
  numRowsUsedInLLM
  error {
    ...CommonError
    __typename
  }
  __typename
}

fragment CommonChartDetail on ThreadResponseChartDetail {
  queryId
  status
  description
  chartType
  chartSchema
  error {
    ...CommonError
    __typename
  }
  adjustment
  __typename
}"
        )
    };
}

const CREATE_ASKING_TASK: &str = "mutation CreateAskingTask($data: AskingTaskInput!) {
  createAskingTask(data: $data) {
    id
    __typename
  }
}";

const ASKING_TASK: &str = concat!(
    "query AskingTask($taskId: String!) {
  askingTask(taskId: $taskId) {
    status
    type
    candidates {
      sql
      type
      view {
        id
        name
        statement
        displayName
        __typename
      }
      __typename
    }
    error {
      ...CommonError
      __typename
    }
    intentReasoning
    __typename
  }
}
",
    common_error_fragment!()
);

const CREATE_THREAD: &str = "mutation CreateThread($data: CreateThreadInput!) {
  createThread(data: $data) {
    id
    __typename
  }
}";

const CREATE_THREAD_RESPONSE: &str = concat!(
    "mutation CreateThreadResponse($threadId: Int!, $data: CreateThreadResponseInput!) {
  createThreadResponse(threadId: $threadId, data: $data) {
    ...CommonResponse
    __typename
  }
}
",
    thread_response_fragments!()
);

const GENERATE_ANSWER: &str = concat!(
    "mutation GenerateThreadResponseAnswer($responseId: Int!) {
  generateThreadResponseAnswer(responseId: $responseId) {
    ...CommonResponse
    __typename
  }
}
",
    thread_response_fragments!()
);

const GENERATE_CHART: &str = concat!(
    "mutation GenerateThreadResponseChart($responseId: Int!) {
  generateThreadResponseChart(responseId: $responseId) {
    ...CommonResponse
    __typename
  }
}
",
    thread_response_fragments!()
);

const THREAD_RESPONSE: &str = concat!(
    "query ThreadResponse($responseId: Int!) {
  threadResponse(responseId: $responseId) {
    ...CommonResponse
    __typename
  }
}
",
    thread_response_fragments!()
);

/// Submit a question as a new asking task
pub fn create_asking_task(question: &str) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "CreateAskingTask",
        variables: json!({ "data": { "question": question } }),
        query: CREATE_ASKING_TASK,
    }
}

/// Read an asking task's status and candidates
pub fn asking_task(task_id: &str) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "AskingTask",
        variables: json!({ "taskId": task_id }),
        query: ASKING_TASK,
    }
}

/// Open a thread for a question and its chosen SQL
pub fn create_thread(question: &str, sql: &str) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "CreateThread",
        variables: json!({ "data": { "sql": sql, "question": question } }),
        query: CREATE_THREAD,
    }
}

/// Add a response to a thread
pub fn create_thread_response(thread_id: i64, question: &str, sql: &str) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "CreateThreadResponse",
        variables: json!({
            "threadId": thread_id,
            "data": { "sql": sql, "question": question }
        }),
        query: CREATE_THREAD_RESPONSE,
    }
}

/// Start answer generation for a thread response
pub fn generate_answer(response_id: i64) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "GenerateThreadResponseAnswer",
        variables: json!({ "responseId": response_id }),
        query: GENERATE_ANSWER,
    }
}

/// Start chart generation for a thread response
pub fn generate_chart(response_id: i64) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "GenerateThreadResponseChart",
        variables: json!({ "responseId": response_id }),
        query: GENERATE_CHART,
    }
}

/// Read a thread response with answer and chart details
pub fn thread_response(response_id: i64) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "ThreadResponse",
        variables: json!({ "responseId": response_id }),
        query: THREAD_RESPONSE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_match_documents() {
        let requests = [
            create_asking_task("q"),
            asking_task("t"),
            create_thread("q", "select 1"),
            create_thread_response(1, "q", "select 1"),
            generate_answer(2),
            generate_chart(2),
            thread_response(2),
        ];
        for request in requests {
            let header = request.query.lines().next().unwrap_or_default();
            assert!(
                header.contains(request.operation_name),
                "{} not declared by its document",
                request.operation_name
            );
        }
    }

    #[test]
    fn test_thread_documents_include_every_fragment() {
        for query in [
            CREATE_THREAD_RESPONSE,
            GENERATE_ANSWER,
            GENERATE_CHART,
            THREAD_RESPONSE,
        ] {
            for fragment in [
                "fragment CommonResponse",
                "fragment CommonBreakdownDetail",
                "fragment CommonError",
                "fragment CommonAnswerDetail",
                "fragment CommonChartDetail",
            ] {
                assert!(query.contains(fragment));
            }
        }
        assert!(ASKING_TASK.contains("fragment CommonError"));
    }

    #[test]
    fn test_thread_response_variables() {
        let request = create_thread_response(12, "top customers?", "SELECT 1");
        assert_eq!(request.variables["threadId"], 12);
        assert_eq!(request.variables["data"]["sql"], "SELECT 1");
        assert_eq!(request.variables["data"]["question"], "top customers?");
    }
}
