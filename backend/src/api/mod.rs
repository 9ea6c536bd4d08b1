//! API module
//!
//! HTTP handlers and the router that mounts them.

pub mod auth;
pub mod github;
pub mod graphql;
pub mod history;
pub mod repositories;
pub mod utils;

use crate::state::SharedState;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Build the application router with all routes and layers
pub fn router(state: SharedState) -> Router {
    let api_key_routes = Router::new()
        .route("/api/repositories", post(repositories::index_repository))
        .route("/api/index_repository", get(repositories::indexing_status))
        .route("/api/query", post(repositories::query_repository))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::require_api_key,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        // Auth, served under both prefixes
        .route("/register", post(auth::register))
        .route("/api/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/api/login", post(auth::login))
        // Question history
        .route("/add_question", post(history::add_question))
        .route("/get_questions", get(history::get_questions))
        // Repository indexing
        .merge(api_key_routes)
        .route(
            "/api/repositoryanalysis",
            post(repositories::repository_analysis),
        )
        .route("/api/filetree", post(repositories::file_tree))
        // GitHub
        .route("/github/login", get(github::login))
        .route("/github/callback", get(github::callback))
        .route("/github/repos", get(github::repos))
        // GraphQL
        .route("/api/codesmell", post(graphql::proxy))
        .route("/api/get_full_response", post(graphql::full_response))
        // Middleware (order matters - request_id should be first)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "CodeSense backend is healthy".to_string(),
    })
}
