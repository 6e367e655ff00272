//! Database collaborator for the question-to-answer pipeline
//!
//! Provides the two things the pipeline needs from a relational database:
//! a textual schema description with sample rows for prompt grounding, and
//! a "run arbitrary SQL, return text" call.
//!
//! ## Features
//!
//! - `postgres` (default) - PostgreSQL support via tokio-postgres
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlchat_catalog::{Database, PostgresDatabase};
//! use sqlchat_core::DatabaseConfig;
//!
//! let config = DatabaseConfig::default();
//! let db = PostgresDatabase::connect(&config, &config.resolve_password()?).await?;
//! let schema = db.describe_schema().await?;
//! let rows = db.run("SELECT COUNT(*) FROM orders;").await?;
//! ```

pub mod database;
pub mod result;
pub mod mock;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use database::{Database, DatabaseError};
pub use result::ResultSet;
pub use mock::{MockDatabase, MockDatabaseBuilder};
#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
