//! Question to SQL answer and chart, via the remote GraphQL service

pub mod backend;
pub mod documents;
pub mod types;
pub mod workflow;

pub use backend::AskBackend;
pub use types::RemoteStatus;
pub use workflow::{AskOutcome, AskWorkflow, PollPolicy};
