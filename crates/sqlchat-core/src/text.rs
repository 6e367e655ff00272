//! Text artifacts that flow through one orchestration call
//!
//! Every stage of the pipeline exchanges plain text. Each artifact gets its
//! own newtype so a raw model response can never be passed where an
//! extracted query is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL statement terminator
pub const TERMINATOR: char = ';';

macro_rules! text_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a string
            pub fn new(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            /// Borrow the underlying text
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Take ownership of the underlying text
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(text: String) -> Self {
                Self(text)
            }
        }

        impl From<&str> for $name {
            fn from(text: &str) -> Self {
                Self(text.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

text_newtype!(
    /// A natural-language question submitted by the user
    Question
);

text_newtype!(
    /// Verbatim text returned by the model for the SQL generation prompt
    ///
    /// May hold a fenced code block, prose, a bare statement, or no SQL at all.
    RawModelResponse
);

text_newtype!(
    /// Textual serialization of the rows a statement returned
    ///
    /// Treated as opaque text by everything downstream of the executor.
    ExecutionResult
);

text_newtype!(
    /// The natural-language answer produced by one orchestration call
    FinalAnswer
);

/// A single SQL statement isolated from a model response
///
/// Construction normalizes the statement so it always ends with a
/// terminator. Nothing else about the SQL is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedQuery(String);

impl ExtractedQuery {
    /// Create a query, appending a terminator when it is missing
    pub fn new(statement: impl Into<String>) -> Self {
        Self(normalize_terminator(statement.into()))
    }

    /// Borrow the statement text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the statement text
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExtractedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtractedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Append a terminator unless the statement already ends with one
fn normalize_terminator(mut statement: String) -> String {
    if !statement.ends_with(TERMINATOR) {
        statement.push(TERMINATOR);
    }
    statement
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_query_appends_terminator() {
        let query = ExtractedQuery::new("SELECT COUNT(*) FROM orders");
        assert_eq!(query.as_str(), "SELECT COUNT(*) FROM orders;");
    }

    #[test]
    fn extracted_query_keeps_existing_terminator() {
        let query = ExtractedQuery::new("SELECT 1;");
        assert_eq!(query.as_str(), "SELECT 1;");
    }

    #[test]
    fn terminator_normalization_is_idempotent() {
        let once = ExtractedQuery::new("SELECT name FROM users");
        let twice = ExtractedQuery::new(once.clone().into_inner());
        assert_eq!(once, twice);
    }

    #[test]
    fn newtypes_display_verbatim() {
        let answer = FinalAnswer::new("There are 42 orders.");
        assert_eq!(answer.to_string(), "There are 42 orders.");

        let raw = RawModelResponse::from("```sql\nSELECT 1\n```");
        assert_eq!(raw.as_str(), "```sql\nSELECT 1\n```");
    }

    #[test]
    fn newtypes_serialize_as_plain_strings() {
        let question = Question::new("How many orders?");
        let json = serde_json::to_string(&question).unwrap();
        assert_eq!(json, "\"How many orders?\"");
    }
}
