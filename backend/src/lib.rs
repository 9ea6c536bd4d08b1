//! CodeSense Backend Library
//!
//! Password auth, repository indexing and query proxying, GitHub OAuth, and
//! the question-to-SQL workflow, exposed for the binary and for tests.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod ask;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
/// Application state shared by handlers
pub mod state;
pub mod store;
pub mod upstream;
