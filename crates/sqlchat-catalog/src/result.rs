//! Textual rendering of returned rows

use serde::{Deserialize, Serialize};
use sqlchat_core::ExecutionResult;

/// Longest value kept in a rendered result
pub const RESULT_VALUE_MAX_LEN: usize = 300;

/// Rows returned by one statement, every value in text form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Row values, `None` for SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render rows as a list of tuples, e.g. `[('Alice', 3), ('Bob', 1)]`
    ///
    /// Numeric values are left bare, everything else is single-quoted, NULL
    /// becomes `None`. An empty result renders as an empty string.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(|v| render_value(v.as_deref())).collect();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect();

        format!("[{}]", tuples.join(", "))
    }

    /// Render into the opaque text handed to the answer prompt
    pub fn into_execution_result(self) -> ExecutionResult {
        ExecutionResult::new(self.render())
    }
}

fn render_value(value: Option<&str>) -> String {
    let Some(value) = value else {
        return "None".to_string();
    };

    let value = truncate(value);
    if is_numeric(&value) {
        value
    } else {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn truncate(value: &str) -> String {
    if value.chars().count() > RESULT_VALUE_MAX_LEN {
        let mut cut: String = value.chars().take(RESULT_VALUE_MAX_LEN).collect();
        cut.push_str("...");
        cut
    } else {
        value.to_string()
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok() && !value.chars().any(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn single_column_rows_keep_trailing_comma() {
        let rs = ResultSet::new(vec!["count".into()], vec![vec![cell("42")]]);
        assert_eq!(rs.render(), "[(42,)]");
    }

    #[test]
    fn mixed_values() {
        let rs = ResultSet::new(
            vec!["name".into(), "total".into(), "note".into()],
            vec![
                vec![cell("Jaxbean Group"), cell("1520.50"), None],
                vec![cell("O'Reilly"), cell("-3"), cell("")],
            ],
        );
        assert_eq!(
            rs.render(),
            "[('Jaxbean Group', 1520.50, None), ('O\\'Reilly', -3, '')]"
        );
    }

    #[test]
    fn words_that_parse_as_floats_stay_quoted() {
        let rs = ResultSet::new(vec!["x".into()], vec![vec![cell("inf")], vec![cell("NaN")]]);
        assert_eq!(rs.render(), "[('inf',), ('NaN',)]");
    }

    #[test]
    fn empty_result_renders_empty_string() {
        let rs = ResultSet::new(vec!["id".into()], vec![]);
        assert!(rs.is_empty());
        assert_eq!(rs.into_execution_result().as_str(), "");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "a".repeat(RESULT_VALUE_MAX_LEN + 50);
        let rendered = render_value(Some(&long));
        assert_eq!(rendered.len(), RESULT_VALUE_MAX_LEN + 3 + 2);
        assert!(rendered.ends_with("...'"));
    }
}
