//! Table metadata and the schema description used for prompt grounding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest sample value shown in a schema description
pub const SAMPLE_VALUE_MAX_LEN: usize = 100;

/// Nullability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nullability {
    /// Definitely nullable
    Yes,

    /// Definitely not nullable
    No,

    /// Cannot determine nullability
    Unknown,
}

impl Nullability {
    /// Parse an `information_schema` `is_nullable` value
    pub fn from_is_nullable(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "YES" => Self::Yes,
            "NO" => Self::No,
            _ => Self::Unknown,
        }
    }
}

/// A column of a described table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,

    /// Database type as reported by the catalog (e.g. `integer`, `numeric(10,2)`)
    pub data_type: String,

    /// Nullability
    pub nullable: Nullability,
}

impl ColumnInfo {
    /// Create a new column with unknown nullability
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: Nullability::Unknown,
        }
    }

    /// Set nullability
    pub fn with_nullability(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }
}

/// A handful of rows sampled from a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRows {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Row values in text form, `None` for SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl SampleRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Metadata for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name (unqualified)
    pub name: String,

    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,

    /// Sample rows, empty when sampling is disabled
    #[serde(default)]
    pub sample_rows: SampleRows,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
            sample_rows: SampleRows::default(),
        }
    }

    /// Attach sample rows
    pub fn with_sample_rows(mut self, sample_rows: SampleRows) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    /// Render as a `CREATE TABLE` block followed by the sample row comment
    pub fn render(&self) -> String {
        let mut out = format!("CREATE TABLE \"{}\" (\n", self.name);

        let column_lines: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let not_null = if col.nullable == Nullability::No { " NOT NULL" } else { "" };
                format!("\t\"{}\" {}{}", col.name, col.data_type.to_uppercase(), not_null)
            })
            .collect();
        out.push_str(&column_lines.join(",\n"));
        out.push_str("\n)");

        if !self.sample_rows.is_empty() {
            out.push_str(&format!(
                "\n\n/*\n{} rows from {} table:\n{}",
                self.sample_rows.rows.len(),
                self.name,
                self.sample_rows.columns.join("\t"),
            ));
            for row in &self.sample_rows.rows {
                let values: Vec<String> = row.iter().map(|v| render_sample_value(v.as_deref())).collect();
                out.push('\n');
                out.push_str(&values.join("\t"));
            }
            out.push_str("\n*/");
        }

        out
    }
}

fn render_sample_value(value: Option<&str>) -> String {
    match value {
        None => "None".to_string(),
        Some(v) if v.chars().count() > SAMPLE_VALUE_MAX_LEN => {
            v.chars().take(SAMPLE_VALUE_MAX_LEN).collect()
        }
        Some(v) => v.to_string(),
    }
}

/// Immutable text snapshot of the database schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Described tables, ordered by name
    pub tables: Vec<TableInfo>,
}

impl SchemaDescription {
    /// Build a description from table metadata
    pub fn from_tables(tables: Vec<TableInfo>) -> Self {
        Self { tables }
    }

    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the full text used inside prompts
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(TableInfo::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
