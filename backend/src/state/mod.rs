//! Application state shared by all handlers
//!
//! Holds configuration, the user store, upstream clients, and the pending
//! GitHub OAuth `state` values.

pub mod oauth;

use crate::ask::{AskWorkflow, PollPolicy};
use crate::config::Config;
use crate::error::AppError;
use crate::store::UserDb;
use crate::upstream::{build_http_client, GithubClient, GraphqlClient, IndexClient};
use std::sync::Arc;

pub use oauth::OAuthStates;

/// State handed to every handler through `State<SharedState>`
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// User and question-history store
    pub db: UserDb,
    /// Repository-indexing service
    pub index: IndexClient,
    /// GitHub OAuth and REST
    pub github: GithubClient,
    /// GraphQL service, used directly by the proxy endpoint
    pub graphql: GraphqlClient,
    /// Question-answering workflow over the GraphQL service
    pub ask: AskWorkflow,
    /// OAuth `state` values issued but not yet seen on a callback
    pub oauth_states: OAuthStates,
}

/// Shared handle to [`AppState`]
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build state from configuration and an opened store
    ///
    /// All upstream clients share one `reqwest::Client`.
    pub fn new(config: Config, db: UserDb) -> Result<Self, AppError> {
        let http = build_http_client(&config)?;
        let graphql = GraphqlClient::new(http.clone(), &config.upstream);
        let ask = AskWorkflow::new(
            Arc::new(graphql.clone()),
            PollPolicy::from(&config.polling),
        );

        Ok(Self {
            index: IndexClient::new(http.clone(), &config.upstream),
            github: GithubClient::new(http, config.github.clone()),
            graphql,
            ask,
            db,
            oauth_states: OAuthStates::default(),
            config: Arc::new(config),
        })
    }
}
