//! PostgreSQL database using information_schema
//!
//! Table and column metadata come from `information_schema.tables` and
//! `information_schema.columns`. Sample rows and ad-hoc statements go through
//! the simple query protocol, which returns every value as text and so needs
//! no per-type decoding.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = DatabaseConfig {
//!     host: "localhost".into(),
//!     dbname: "text_to_sql".into(),
//!     ..DatabaseConfig::default()
//! };
//! let db = PostgresDatabase::connect(&config, "password").await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema-columns.html

use crate::database::{Database, DatabaseError};
use crate::result::ResultSet;
use sqlchat_core::{
    ColumnInfo, DatabaseConfig, ExecutionResult, Nullability, SampleRows, SchemaDescription, TableInfo,
};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};

use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;

/// PostgreSQL database
///
/// Holds one client for the life of the process. `tokio_postgres::Client`
/// pipelines concurrent requests itself, so no extra locking is needed.
pub struct PostgresDatabase {
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,

    /// Schema whose tables are described
    schema: String,

    /// Sample rows per table
    sample_rows: usize,

    /// Restrict description to these tables (all when empty)
    include_tables: Vec<String>,
}

impl PostgresDatabase {
    /// Connect using the database section of `sqlchat.toml`
    ///
    /// Uses TLS when `config.tls` is set. Fails with a connection or
    /// authentication error when the server cannot be reached.
    #[tracing::instrument(skip(config, password), fields(host = %config.host, port = config.port, dbname = %config.dbname))]
    pub async fn connect(config: &DatabaseConfig, password: &str) -> Result<Self, DatabaseError> {
        let mut pg = PgConfig::new();
        pg.host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(password)
            .dbname(&config.dbname);

        let client = if config.tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| DatabaseError::ConfigError(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let (client, connection) = pg
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| map_connect_error(e, &config.host, config.port))?;

            let (host, port) = (config.host.clone(), config.port);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!("PostgreSQL TLS connection error ({}:{}): {}", host, port, e);
                }
            });

            client
        } else {
            let (client, connection) = pg
                .connect(NoTls)
                .await
                .map_err(|e| map_connect_error(e, &config.host, config.port))?;

            let (host, port) = (config.host.clone(), config.port);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!("PostgreSQL connection error ({}:{}): {}", host, port, e);
                }
            });

            client
        };

        tracing::info!("connected to PostgreSQL");

        Ok(Self {
            client,
            host: config.host.clone(),
            port: config.port,
            database: config.dbname.clone(),
            schema: config.schema.clone(),
            sample_rows: config.sample_rows,
            include_tables: config.include_tables.clone(),
        })
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = self.client
            .query(query, &[&self.schema])
            .await
            .map_err(map_query_error)?;

        let tables = rows
            .iter()
            .map(|row| row.get::<_, String>(0))
            .filter(|name| self.include_tables.is_empty() || self.include_tables.contains(name))
            .collect();

        Ok(tables)
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DatabaseError> {
        let query = r#"
            SELECT
                column_name::text,
                data_type::text,
                is_nullable::text,
                udt_name::text,
                character_maximum_length::int4,
                numeric_precision::int4,
                numeric_scale::int4
            FROM information_schema.columns
            WHERE table_schema = $1
              AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let rows = self.client
            .query(query, &[&self.schema, &table])
            .await
            .map_err(map_query_error)?;

        let columns = rows
            .iter()
            .map(|row| {
                let name: String = row.get(0);
                let data_type: String = row.get(1);
                let is_nullable: String = row.get(2);
                let udt_name: String = row.get(3);
                let max_length: Option<i32> = row.get(4);
                let precision: Option<i32> = row.get(5);
                let scale: Option<i32> = row.get(6);

                let full_type = display_type(&data_type, &udt_name, max_length, precision, scale);
                ColumnInfo::new(name, full_type)
                    .with_nullability(Nullability::from_is_nullable(&is_nullable))
            })
            .collect();

        Ok(columns)
    }

    async fn fetch_sample_rows(&self, table: &str) -> Result<SampleRows, DatabaseError> {
        if self.sample_rows == 0 {
            return Ok(SampleRows::default());
        }

        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(&self.schema),
            quote_ident(table),
            self.sample_rows
        );

        samples_or_empty(table, self.simple_query(&sql).await)
    }

    async fn simple_query(&self, sql: &str) -> Result<ResultSet, DatabaseError> {
        let messages = self.client
            .simple_query(sql)
            .await
            .map_err(map_query_error)?;

        let mut result = ResultSet::default();

        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if result.columns.is_empty() {
                    result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                let values = (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect();
                result.rows.push(values);
            }
        }

        Ok(result)
    }
}

#[async_trait::async_trait]
impl Database for PostgresDatabase {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[tracing::instrument(skip(self), fields(schema = %self.schema))]
    async fn describe_schema(&self) -> Result<SchemaDescription, DatabaseError> {
        let mut tables = Vec::new();

        for name in self.list_tables().await? {
            let columns = self.fetch_columns(&name).await?;
            let sample_rows = self.fetch_sample_rows(&name).await?;
            tables.push(TableInfo::new(name, columns).with_sample_rows(sample_rows));
        }

        tracing::debug!(tables = tables.len(), "described schema");
        Ok(SchemaDescription::from_tables(tables))
    }

    #[tracing::instrument(skip(self, sql), fields(sql_len = sql.len()))]
    async fn run(&self, sql: &str) -> Result<ExecutionResult, DatabaseError> {
        let result = self.simple_query(sql).await?;
        tracing::debug!(rows = result.rows.len(), "statement returned");
        Ok(result.into_execution_result())
    }

    async fn test_connection(&self) -> Result<(), DatabaseError> {
        // Simple query to test connection
        self.client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| DatabaseError::ConnectionError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }
}

/// Build the type shown in the schema description
///
/// - `numeric` with precision/scale becomes `numeric(p,s)`
/// - character types with a length become `character varying(n)`
/// - arrays (`_int4`) become `int4[]`
/// - user-defined types use their udt name
fn display_type(
    data_type: &str,
    udt_name: &str,
    max_length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    match data_type {
        "numeric" | "decimal" => match (precision, scale) {
            (Some(p), Some(s)) => format!("numeric({},{})", p, s),
            (Some(p), None) => format!("numeric({})", p),
            _ => data_type.to_string(),
        },
        "character varying" | "character" => match max_length {
            Some(n) => format!("{}({})", data_type, n),
            None => data_type.to_string(),
        },
        "ARRAY" => match udt_name.strip_prefix('_') {
            Some(element) => format!("{}[]", element),
            None => udt_name.to_string(),
        },
        "USER-DEFINED" => udt_name.to_string(),
        _ => data_type.to_string(),
    }
}

/// Keep the table in the description when its rows cannot be read
///
/// A role may see a table in information_schema without holding SELECT on
/// it. Only an unreachable server is an error here.
fn samples_or_empty(
    table: &str,
    result: Result<ResultSet, DatabaseError>,
) -> Result<SampleRows, DatabaseError> {
    match result {
        Ok(rows) => Ok(SampleRows::new(rows.columns, rows.rows)),
        Err(e) if e.is_connection_error() => Err(e),
        Err(e) => {
            tracing::warn!(table, error = %e, "could not sample table, describing it without rows");
            Ok(SampleRows::default())
        }
    }
}

/// Quote an identifier for interpolation into SQL text
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn map_connect_error(e: tokio_postgres::Error, host: &str, port: u16) -> DatabaseError {
    let auth_failure = e.code().map_or(false, |code| {
        *code == SqlState::INVALID_PASSWORD || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION
    });

    let message = format!("Failed to connect to PostgreSQL at {}:{}: {}", host, port, e);
    if auth_failure {
        DatabaseError::AuthenticationError(message)
    } else {
        DatabaseError::ConnectionError(message)
    }
}

fn map_query_error(e: tokio_postgres::Error) -> DatabaseError {
    if e.is_closed() {
        return DatabaseError::ConnectionError(e.to_string());
    }

    let Some(db_error) = e.as_db_error() else {
        return DatabaseError::QueryError(e.to_string());
    };

    let mut message = format!("{}: {}", db_error.severity(), db_error.message());
    if let Some(detail) = db_error.detail() {
        message.push_str(&format!("\nDETAIL: {}", detail));
    }
    if let Some(hint) = db_error.hint() {
        message.push_str(&format!("\nHINT: {}", hint));
    }

    if *db_error.code() == SqlState::INSUFFICIENT_PRIVILEGE {
        DatabaseError::PermissionDenied(message)
    } else {
        DatabaseError::QueryError(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_display_type() {
        assert_eq!(display_type("numeric", "numeric", None, Some(10), Some(2)), "numeric(10,2)");
        assert_eq!(display_type("numeric", "numeric", None, Some(10), None), "numeric(10)");
        assert_eq!(display_type("numeric", "numeric", None, None, None), "numeric");
    }

    #[test]
    fn test_character_display_type() {
        assert_eq!(
            display_type("character varying", "varchar", Some(255), None, None),
            "character varying(255)"
        );
        assert_eq!(display_type("text", "text", None, None, None), "text");
    }

    #[test]
    fn test_array_display_type() {
        assert_eq!(display_type("ARRAY", "_int4", None, None, None), "int4[]");
        assert_eq!(display_type("ARRAY", "_text", None, None, None), "text[]");
    }

    #[test]
    fn test_user_defined_display_type() {
        assert_eq!(display_type("USER-DEFINED", "order_status", None, None, None), "order_status");
    }

    #[test]
    fn test_unreadable_table_has_no_samples() {
        let denied = Err(DatabaseError::PermissionDenied(
            "ERROR: permission denied for table salaries".into(),
        ));
        let samples = samples_or_empty("salaries", denied).unwrap();
        assert!(samples.is_empty());

        let failed = Err(DatabaseError::QueryError("ERROR: could not read block".into()));
        assert!(samples_or_empty("orders", failed).unwrap().is_empty());
    }

    #[test]
    fn test_lost_connection_while_sampling_is_an_error() {
        let lost = Err(DatabaseError::ConnectionError("connection closed".into()));
        let err = samples_or_empty("orders", lost).unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_readable_table_keeps_samples() {
        let rows = ResultSet::new(vec!["id".into()], vec![vec![Some("1".into())]]);
        let samples = samples_or_empty("orders", Ok(rows)).unwrap();
        assert_eq!(samples.columns, vec!["id".to_string()]);
        assert_eq!(samples.rows, vec![vec![Some("1".to_string())]]);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
