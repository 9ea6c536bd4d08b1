//! User store database operations
//!
//! Handles all database interactions for users and question history.

use crate::error::AppError;
use crate::store::models::{NewQuestion, QuestionRecord, User};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection pool for user and history operations
#[derive(Clone)]
pub struct UserDb {
    pool: SqlitePool,
}

impl UserDb {
    /// Initialize database connection pool
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file (or a `sqlite:` URL)
    /// * `max_connections` - Upper bound on pooled connections
    ///
    /// # Returns
    /// * `Ok(UserDb)` if successful
    /// * `Err(AppError)` if connection failed
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self, AppError> {
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            // Ensure parent directory exists
            if let Some(parent) = PathBuf::from(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Internal(anyhow::anyhow!(
                            "Failed to create db directory: {}",
                            e
                        ))
                    })?;
                }
            }
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_users.sql");

        // Remove comments and normalize whitespace
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(comment_pos) => &trimmed[..comment_pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        let statements: Vec<&str> = cleaned_sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Insert a new user, returning its id
    ///
    /// A duplicate username surfaces as `AppError::RegistrationFailed`.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, AppError> {
        let result = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    tracing::warn!(username = %username, "Registration rejected: username taken");
                    AppError::RegistrationFailed
                }
                _ => AppError::Storage(format!("Failed to create user: {}", e)),
            })?;

        let id = result.last_insert_rowid();
        debug!("Created user {} ({})", id, username);
        Ok(id)
    }

    /// Look up a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, api_key FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the user's session token
    pub async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET api_key = ? WHERE id = ?")
            .bind(api_key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        debug!("Rotated api key for user {}", user_id);
        Ok(())
    }

    /// Find the user owning a session token
    pub async fn find_user_id_by_api_key(&self, api_key: &str) -> Result<Option<i64>, AppError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE api_key = ?")
            .bind(api_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    /// Store a question in a user's history, returning the row id
    pub async fn add_question(&self, question: &NewQuestion) -> Result<i64, AppError> {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO question_history (user_id, chat_type, timestamp, question, repositoryname, branchname, projectname) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(question.user_id)
        .bind(&question.chat_type)
        .bind(timestamp)
        .bind(&question.question)
        .bind(&question.repositoryname)
        .bind(&question.branch)
        .bind(&question.projectname)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to add question: {}", e)))?;

        debug!("Stored question for user {}", question.user_id);
        Ok(result.last_insert_rowid())
    }

    /// Get a user's question history, oldest first
    pub async fn questions_for_user(&self, user_id: i64) -> Result<Vec<QuestionRecord>, AppError> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, user_id, chat_type, timestamp, question, repositoryname, branchname, projectname FROM question_history WHERE user_id = ? ORDER BY id ASC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to fetch questions: {}", e)))?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, UserDb) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let db = UserDb::new(path.to_str().unwrap(), 1).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (_dir, db) = test_db().await;
        let id = db.create_user("tester", "hash").await.unwrap();

        let user = db.find_by_username("tester").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.password, "hash");
        assert!(user.api_key.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_registration_failure() {
        let (_dir, db) = test_db().await;
        db.create_user("tester", "hash").await.unwrap();

        let err = db.create_user("tester", "other").await.unwrap_err();
        assert!(matches!(err, AppError::RegistrationFailed));
    }

    #[tokio::test]
    async fn test_api_key_lookup() {
        let (_dir, db) = test_db().await;
        let id = db.create_user("tester", "hash").await.unwrap();
        db.set_api_key(id, "key-1").await.unwrap();

        assert_eq!(db.find_user_id_by_api_key("key-1").await.unwrap(), Some(id));
        assert_eq!(db.find_user_id_by_api_key("missing").await.unwrap(), None);

        db.set_api_key(id, "key-2").await.unwrap();
        assert_eq!(db.find_user_id_by_api_key("key-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_question_history_is_per_user() {
        let (_dir, db) = test_db().await;
        let alice = db.create_user("alice", "hash").await.unwrap();
        let bob = db.create_user("bob", "hash").await.unwrap();

        for (user_id, question) in [(alice, "first"), (bob, "other"), (alice, "second")] {
            db.add_question(&NewQuestion {
                user_id,
                chat_type: "repo".to_string(),
                question: question.to_string(),
                repositoryname: Some("microsoft/vscode".to_string()),
                branch: Some("main".to_string()),
                projectname: None,
            })
            .await
            .unwrap();
        }

        let history = db.questions_for_user(alice).await.unwrap();
        let questions: Vec<&str> = history.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(questions, vec!["first", "second"]);
        assert_eq!(history[0].branchname.as_deref(), Some("main"));
        assert!(chrono::DateTime::parse_from_rfc3339(&history[0].timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_question_for_unknown_user_fails() {
        let (_dir, db) = test_db().await;
        let result = db
            .add_question(&NewQuestion {
                user_id: 999,
                chat_type: "repo".to_string(),
                question: "orphan".to_string(),
                repositoryname: None,
                branch: None,
                projectname: None,
            })
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
