//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Upstream credentials have no defaults and must be
//! supplied through the environment (or a `.env` file).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Relational store configuration
    pub database: DatabaseConfig,
    /// Third-party service endpoints and credentials
    pub upstream: UpstreamConfig,
    /// GitHub OAuth application settings
    pub github: GithubConfig,
    /// Polling behaviour of the question-answering workflow
    pub polling: PollingConfig,
    /// Password hashing settings
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// Relational store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite database path or `sqlite:` URL
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "codesense.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Upstream service configuration
#[derive(Clone)]
pub struct UpstreamConfig {
    /// GraphQL endpoint of the question-answering service
    pub graphql_url: String,
    /// Streaming-answer endpoint; `responseId` is appended as a query parameter
    pub streaming_answer_url: String,
    /// Base URL of the repository-indexing service (with trailing slash)
    pub index_base_url: String,
    /// Value of the `Authorization` header sent to the indexing service
    pub index_api_key: String,
    /// Timeout applied to every outbound request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            graphql_url: "https://codesenseai.mannit.co/api/graphql".to_string(),
            streaming_answer_url: "https://codesenseai.mannit.co/api/ask_task/streaming_answer"
                .to_string(),
            index_base_url: "https://api.trynia.ai/v2/".to_string(),
            index_api_key: String::new(),
            request_timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("graphql_url", &self.graphql_url)
            .field("streaming_answer_url", &self.streaming_answer_url)
            .field("index_base_url", &self.index_base_url)
            .field("index_api_key", &redact(&self.index_api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// GitHub OAuth configuration
#[derive(Clone)]
pub struct GithubConfig {
    /// OAuth application client id
    pub client_id: String,
    /// OAuth application client secret
    pub client_secret: String,
    /// Callback URL registered with GitHub (points at `/github/callback`)
    pub redirect_uri: String,
    /// Frontend route that receives the access token after login
    pub frontend_callback_url: String,
    /// Requested OAuth scope
    pub scope: String,
    /// Base URL for the browser-facing OAuth pages
    pub oauth_base_url: String,
    /// Base URL for the REST API
    pub api_base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:5000/github/callback".to_string(),
            frontend_callback_url: "http://localhost:5173/auth/github/callback".to_string(),
            scope: "repo".to_string(),
            oauth_base_url: "https://github.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
        }
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("frontend_callback_url", &self.frontend_callback_url)
            .field("scope", &self.scope)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Polling configuration for the question-answering workflow
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Wait between two status polls, in milliseconds
    pub interval_ms: u64,
    /// Maximum polls per loop before giving up
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 150, // 5 minutes at the default interval
        }
    }
}

impl PollingConfig {
    /// Poll interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                port: parse_var("PORT").unwrap_or(defaults.server.port),
                host: env::var("HOST").unwrap_or(defaults.server.host),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
            },
            upstream: UpstreamConfig {
                graphql_url: env::var("GRAPHQL_URL").unwrap_or(defaults.upstream.graphql_url),
                streaming_answer_url: env::var("STREAMING_ANSWER_URL")
                    .unwrap_or(defaults.upstream.streaming_answer_url),
                index_base_url: env::var("INDEX_BASE_URL")
                    .unwrap_or(defaults.upstream.index_base_url),
                index_api_key: env::var("INDEX_API_KEY").unwrap_or_default(),
                request_timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or(defaults.upstream.request_timeout_secs),
            },
            github: GithubConfig {
                client_id: env::var("GITHUB_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("GITHUB_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: env::var("GITHUB_REDIRECT_URI")
                    .unwrap_or(defaults.github.redirect_uri),
                frontend_callback_url: env::var("FRONTEND_CALLBACK_URL")
                    .unwrap_or(defaults.github.frontend_callback_url),
                scope: env::var("GITHUB_SCOPE").unwrap_or(defaults.github.scope),
                oauth_base_url: defaults.github.oauth_base_url,
                api_base_url: defaults.github.api_base_url,
            },
            polling: PollingConfig {
                interval_ms: parse_var("POLL_INTERVAL_MS").unwrap_or(defaults.polling.interval_ms),
                max_attempts: parse_var("POLL_MAX_ATTEMPTS")
                    .unwrap_or(defaults.polling.max_attempts),
            },
            auth: AuthConfig {
                bcrypt_cost: parse_var("BCRYPT_COST").unwrap_or(defaults.auth.bcrypt_cost),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
