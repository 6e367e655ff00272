//! Statement execution
//!
//! Every database failure during execution is recoverable: the message is
//! handed back to the orchestrator, which shows it to the user.

use sqlchat_catalog::{Database, DatabaseError};
use sqlchat_core::{ExecutionResult, ExtractedQuery};
use std::sync::Arc;

/// A statement the database refused or could not run
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .source.message())]
pub struct ExecutionError {
    source: DatabaseError,
}

impl ExecutionError {
    /// The database error as reported by the backend
    pub fn database_error(&self) -> &DatabaseError {
        &self.source
    }
}

impl From<DatabaseError> for ExecutionError {
    fn from(source: DatabaseError) -> Self {
        Self { source }
    }
}

/// Runs extracted statements on the shared connection
pub struct QueryExecutor {
    db: Arc<dyn Database>,
}

impl QueryExecutor {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip_all, fields(backend = self.db.name()))]
    pub async fn execute(&self, query: &ExtractedQuery) -> Result<ExecutionResult, ExecutionError> {
        match self.db.run(query.as_str()).await {
            Ok(result) => {
                tracing::debug!(result = %result, "statement executed");
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, sql = %query, "statement failed");
                Err(e.into())
            }
        }
    }
}
