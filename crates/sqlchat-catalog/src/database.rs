//! Database trait for schema description and statement execution

use sqlchat_core::{ExecutionResult, SchemaDescription};

/// Errors that can occur when talking to the database
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseError {
    /// Whether the database could not be reached at all
    ///
    /// Connection failures are fatal; every other variant describes a
    /// statement that the database rejected.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionError(_) | DatabaseError::AuthenticationError(_)
        )
    }

    /// The underlying message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            DatabaseError::ConnectionError(m)
            | DatabaseError::AuthenticationError(m)
            | DatabaseError::PermissionDenied(m)
            | DatabaseError::QueryError(m)
            | DatabaseError::ConfigError(m) => m,
        }
    }
}

/// A live database the pipeline can describe and query
///
/// One instance is created at startup and shared by every orchestration
/// call, so implementations must be safe to use from several tasks.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Get the backend name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Describe every table of the configured schema
    ///
    /// Issues metadata queries and includes a small fixed number of sample
    /// rows per table. Fails with a connection error when the database is
    /// unreachable.
    async fn describe_schema(&self) -> Result<SchemaDescription, DatabaseError>;

    /// Run an arbitrary statement and serialize the returned rows to text
    ///
    /// Nothing about the statement is validated; whatever the database
    /// rejects comes back as an error carrying its message.
    async fn run(&self, sql: &str) -> Result<ExecutionResult, DatabaseError>;

    /// Test the connection to the database
    async fn test_connection(&self) -> Result<(), DatabaseError>;
}
