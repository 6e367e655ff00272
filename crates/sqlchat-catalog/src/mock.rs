//! Mock database for testing
//!
//! Returns predefined schema metadata and statement results without
//! connecting to any server. Useful for:
//! - Unit testing the orchestration paths
//! - Demos without real credentials
//! - Simulating connection loss and rejected statements
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlchat_catalog::{MockDatabase, Database};
//!
//! let db = MockDatabase::new();
//! db.add_result("SELECT COUNT(*) FROM orders;", "[(42,)]").await;
//!
//! let result = db.run("SELECT COUNT(*) FROM orders;").await?;
//! assert_eq!(result.as_str(), "[(42,)]");
//! assert_eq!(db.executed_queries().await.len(), 1);
//! ```

use crate::database::{Database, DatabaseError};
use sqlchat_core::{ExecutionResult, SampleRows, SchemaDescription, TableInfo};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock database for testing
///
/// Results and errors are keyed by the exact statement text. Every statement
/// passed to `run` is recorded so tests can assert whether execution
/// happened at all.
pub struct MockDatabase {
    /// Tables returned by `describe_schema`
    tables: Arc<RwLock<Vec<TableInfo>>>,

    /// Results by statement text
    results: Arc<RwLock<HashMap<String, ExecutionResult>>>,

    /// Errors by statement text
    errors: Arc<RwLock<HashMap<String, DatabaseError>>>,

    /// Result for statements with no configured entry
    default_result: Option<ExecutionResult>,

    /// Statements passed to `run`, in order
    executed: Arc<RwLock<Vec<String>>>,

    /// Tables whose rows the role may not read
    unreadable: Arc<RwLock<HashSet<String>>>,

    /// Simulate an unreachable database
    fail_connection: bool,
}

impl MockDatabase {
    /// Create a new mock with no tables and no results
    pub fn new() -> Self {
        MockDatabaseBuilder::new().build()
    }

    /// Add a table to the schema description
    pub async fn add_table(&self, table: TableInfo) {
        self.tables.write().await.push(table);
    }

    /// Configure the result returned for a statement
    pub async fn add_result(&self, sql: &str, result: impl Into<ExecutionResult>) {
        self.results.write().await.insert(sql.to_string(), result.into());
    }

    /// Configure an error returned for a statement
    pub async fn add_error(&self, sql: &str, error: DatabaseError) {
        self.errors.write().await.insert(sql.to_string(), error);
    }

    /// Deny reading rows of a table; it is still described, without samples
    pub async fn add_unreadable_table(&self, name: &str) {
        self.unreadable.write().await.insert(name.to_string());
    }

    /// Configure to fail every call with a connection error
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Statements passed to `run` so far
    pub async fn executed_queries(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }

    fn check_connection(&self) -> Result<(), DatabaseError> {
        if self.fail_connection {
            Err(DatabaseError::ConnectionError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockDatabase {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            results: Arc::clone(&self.results),
            errors: Arc::clone(&self.errors),
            default_result: self.default_result.clone(),
            executed: Arc::clone(&self.executed),
            unreadable: Arc::clone(&self.unreadable),
            fail_connection: self.fail_connection,
        }
    }
}

#[async_trait::async_trait]
impl Database for MockDatabase {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn describe_schema(&self) -> Result<SchemaDescription, DatabaseError> {
        self.check_connection()?;

        let unreadable = self.unreadable.read().await;
        let mut tables: Vec<TableInfo> = self
            .tables
            .read()
            .await
            .iter()
            .cloned()
            .map(|table| {
                if unreadable.contains(&table.name) {
                    table.with_sample_rows(SampleRows::default())
                } else {
                    table
                }
            })
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(SchemaDescription::from_tables(tables))
    }

    async fn run(&self, sql: &str) -> Result<ExecutionResult, DatabaseError> {
        self.check_connection()?;
        self.executed.write().await.push(sql.to_string());

        if let Some(error) = self.errors.read().await.get(sql) {
            return Err(error.clone());
        }

        if let Some(result) = self.results.read().await.get(sql) {
            return Ok(result.clone());
        }

        self.default_result.clone().ok_or_else(|| {
            DatabaseError::QueryError(format!("no result configured for statement: {}", sql))
        })
    }

    async fn test_connection(&self) -> Result<(), DatabaseError> {
        self.check_connection()
    }
}

/// Builder for creating a MockDatabase with predefined tables and results
///
/// # Example
///
/// ```rust,ignore
/// let db = MockDatabaseBuilder::new()
///     .with_table(TableInfo::new("orders", vec![ColumnInfo::new("id", "integer")]))
///     .with_result("SELECT COUNT(*) FROM orders;", "[(42,)]")
///     .build();
/// ```
pub struct MockDatabaseBuilder {
    tables: Vec<TableInfo>,
    results: HashMap<String, ExecutionResult>,
    errors: HashMap<String, DatabaseError>,
    default_result: Option<ExecutionResult>,
    unreadable: HashSet<String>,
    fail_connection: bool,
}

impl MockDatabaseBuilder {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            results: HashMap::new(),
            errors: HashMap::new(),
            default_result: None,
            unreadable: HashSet::new(),
            fail_connection: false,
        }
    }

    pub fn with_table(mut self, table: TableInfo) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_result(mut self, sql: &str, result: impl Into<ExecutionResult>) -> Self {
        self.results.insert(sql.to_string(), result.into());
        self
    }

    pub fn with_error(mut self, sql: &str, error: DatabaseError) -> Self {
        self.errors.insert(sql.to_string(), error);
        self
    }

    /// Result returned for any statement without its own entry
    pub fn with_default_result(mut self, result: impl Into<ExecutionResult>) -> Self {
        self.default_result = Some(result.into());
        self
    }

    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Table the role can see but not read
    pub fn with_unreadable_table(mut self, name: &str) -> Self {
        self.unreadable.insert(name.to_string());
        self
    }

    pub fn build(self) -> MockDatabase {
        MockDatabase {
            tables: Arc::new(RwLock::new(self.tables)),
            results: Arc::new(RwLock::new(self.results)),
            errors: Arc::new(RwLock::new(self.errors)),
            default_result: self.default_result,
            executed: Arc::new(RwLock::new(Vec::new())),
            unreadable: Arc::new(RwLock::new(self.unreadable)),
            fail_connection: self.fail_connection,
        }
    }
}

impl Default for MockDatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
