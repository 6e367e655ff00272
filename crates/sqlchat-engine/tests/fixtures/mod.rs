//! Shared fixtures for pipeline integration tests
//!
//! A small sales database with two tables, plus helpers that wire a mock
//! database and a scripted model into an orchestrator.

use sqlchat_catalog::{MockDatabase, MockDatabaseBuilder};
use sqlchat_core::{ColumnInfo, Nullability, SampleRows, TableInfo};
use sqlchat_engine::Orchestrator;
use sqlchat_llm::ScriptedModel;
use std::sync::Arc;

/// Orders table with two sample rows
pub fn orders_table() -> TableInfo {
    TableInfo::new(
        "orders",
        vec![
            ColumnInfo::new("id", "INTEGER").with_nullability(Nullability::No),
            ColumnInfo::new("customer", "TEXT").with_nullability(Nullability::No),
            ColumnInfo::new("total", "NUMERIC(10,2)").with_nullability(Nullability::Yes),
        ],
    )
    .with_sample_rows(SampleRows::new(
        vec!["id".into(), "customer".into(), "total".into()],
        vec![
            vec![Some("1".into()), Some("Jaxbean Group".into()), Some("19.99".into())],
            vec![Some("2".into()), Some("Skinix".into()), None],
        ],
    ))
}

/// Salaries table with rows the application role cannot read
pub fn salaries_table() -> TableInfo {
    TableInfo::new(
        "salaries",
        vec![
            ColumnInfo::new("employee_id", "INTEGER"),
            ColumnInfo::new("amount", "NUMERIC(12,2)"),
        ],
    )
    .with_sample_rows(SampleRows::new(
        vec!["employee_id".into(), "amount".into()],
        vec![vec![Some("7".into()), Some("98765.43".into())]],
    ))
}

/// Mock database holding both tables and no results
///
/// `salaries` is visible in the catalog but its rows are not readable, so
/// it is described without samples.
pub fn sales_database() -> MockDatabaseBuilder {
    MockDatabaseBuilder::new()
        .with_table(orders_table())
        .with_table(salaries_table())
        .with_unreadable_table("salaries")
}

/// Orchestrator over clones of the given mock and model
///
/// The clones share state with the originals, so tests can inspect the
/// executed statements and recorded prompts afterwards.
pub fn orchestrator(db: &MockDatabase, model: &ScriptedModel) -> Orchestrator {
    Orchestrator::new(Arc::new(db.clone()), Arc::new(model.clone()))
        .expect("built-in templates compile")
}
