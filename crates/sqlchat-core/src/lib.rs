//! SQLChat Core
//!
//! Domain model shared by every stage of the question-to-answer pipeline,
//! plus the `sqlchat.toml` configuration schema.

pub mod text;
pub mod schema;
pub mod history;
pub mod config;

pub use text::{Question, RawModelResponse, ExtractedQuery, ExecutionResult, FinalAnswer, TERMINATOR};
pub use schema::{ColumnInfo, Nullability, SampleRows, TableInfo, SchemaDescription};
pub use history::{ConversationHistory, Message, Role};
pub use config::{Config, DatabaseConfig, ModelConfig, ConfigError};
