//! Store module
//!
//! Handles user accounts and question history using a SQLite database.

pub mod db;
pub mod models;

pub use db::UserDb;
pub use models::{NewQuestion, QuestionRecord, User};
