//! Store data models
//!
//! Defines rows for users and question history.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Row identifier
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Salted password hash (never the plain password)
    pub password: String,
    /// Current session token, if the user has logged in
    pub api_key: Option<String>,
}

/// A question stored in a user's history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRecord {
    /// Row identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Which chat surface the question came from (free-form label)
    pub chat_type: String,
    /// When the question was stored (RFC 3339, UTC)
    pub timestamp: String,
    /// The question text
    pub question: String,
    /// Repository the question was about, if any
    pub repositoryname: Option<String>,
    /// Branch the question was about, if any
    pub branchname: Option<String>,
    /// Project the question was about, if any
    pub projectname: Option<String>,
}

/// Input for inserting a question history row
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    /// Owning user
    pub user_id: i64,
    /// Which chat surface the question came from
    pub chat_type: String,
    /// The question text
    pub question: String,
    /// Repository the question was about
    #[serde(default)]
    pub repositoryname: Option<String>,
    /// Branch the question was about
    #[serde(default, alias = "branchname")]
    pub branch: Option<String>,
    /// Project the question was about
    #[serde(default)]
    pub projectname: Option<String>,
}
