//! Fatal pipeline errors
//!
//! Only conditions that abort an orchestration call live here. Missing SQL,
//! direct answers and rejected statements are turned into a final answer
//! by the orchestrator instead.

use sqlchat_catalog::DatabaseError;
use sqlchat_llm::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("Database unavailable: {0}")]
    Connection(#[from] DatabaseError),

    #[error("Prompt template error: {0}")]
    Template(String),
}

impl From<minijinja::Error> for PipelineError {
    fn from(e: minijinja::Error) -> Self {
        PipelineError::Template(e.to_string())
    }
}
