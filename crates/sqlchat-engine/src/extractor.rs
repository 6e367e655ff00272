//! Isolate a single SQL statement from free-text model output
//!
//! Model output is unstructured: it may wrap the statement in a markdown
//! fence, surround it with prose, emit it bare, or decline to write SQL at
//! all. Extraction tries an ordered list of matchers and stops at the first
//! one that finds something:
//!
//! 1. [`FencedBlockMatcher`] - the inner content of the first fence labeled
//!    `sql` (case-insensitive)
//! 2. [`BareStatementMatcher`] - the first `SELECT ... ;` substring
//!    (case-insensitive, may span lines)
//!
//! When neither matches, a response that never mentions `SELECT` is taken
//! as the model answering directly. One that does mention it is an
//! extraction failure.
//!
//! Both matchers capture the shortest match, so when a response holds
//! several candidates only the first is used. The statement is not parsed
//! or checked in any way beyond terminator normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlchat_core::{ExtractedQuery, RawModelResponse};

static FENCED_SQL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```sql\s*(.*?)\s*```").expect("fenced sql pattern is valid")
});

static BARE_SELECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(SELECT.*?;)").expect("bare select pattern is valid")
});

/// Which matcher isolated the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// Inside a ```sql fence
    FencedBlock,

    /// A bare `SELECT ... ;` in the text
    BareStatement,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::FencedBlock => "fenced_block",
            ExtractionTier::BareStatement => "bare_statement",
        }
    }
}

/// Result of a single matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Captured statement text, already trimmed
    Found(String),
    NotFound,
}

/// One strategy for locating a statement in model output
pub trait QueryMatcher: Send + Sync {
    fn tier(&self) -> ExtractionTier;

    fn find(&self, raw: &str) -> MatchResult;
}

/// Captures the inner content of the first ```sql fence
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedBlockMatcher;

impl QueryMatcher for FencedBlockMatcher {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::FencedBlock
    }

    fn find(&self, raw: &str) -> MatchResult {
        // An empty fence is skipped so the next matcher gets a chance
        match FENCED_SQL_REGEX.captures(raw).and_then(|c| c.get(1)) {
            Some(inner) if !inner.as_str().trim().is_empty() => {
                MatchResult::Found(inner.as_str().trim().to_string())
            }
            _ => MatchResult::NotFound,
        }
    }
}

/// Captures from the first `SELECT` to the next `;`, inclusive
#[derive(Debug, Clone, Copy, Default)]
pub struct BareStatementMatcher;

impl QueryMatcher for BareStatementMatcher {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::BareStatement
    }

    fn find(&self, raw: &str) -> MatchResult {
        match BARE_SELECT_REGEX.find(raw) {
            Some(m) => MatchResult::Found(m.as_str().trim().to_string()),
            None => MatchResult::NotFound,
        }
    }
}

/// Outcome of extracting from one model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A statement was isolated and terminator-normalized
    Query {
        query: ExtractedQuery,
        tier: ExtractionTier,
    },

    /// The model answered without writing SQL; the text is the answer
    DirectAnswer(String),

    /// The response mentions SQL but no statement could be isolated
    NoQueryFound { reason: String },
}

/// Runs matchers in order and applies the no-SQL fallback
pub struct QueryExtractor {
    matchers: Vec<Box<dyn QueryMatcher>>,
}

impl QueryExtractor {
    /// Extractor with the fenced-block then bare-statement matchers
    pub fn new() -> Self {
        Self::with_matchers(vec![
            Box::new(FencedBlockMatcher),
            Box::new(BareStatementMatcher),
        ])
    }

    /// Extractor with a custom matcher order
    pub fn with_matchers(matchers: Vec<Box<dyn QueryMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn extract(&self, raw: &RawModelResponse) -> Extraction {
        let text = raw.as_str();

        for matcher in &self.matchers {
            if let MatchResult::Found(statement) = matcher.find(text) {
                let query = ExtractedQuery::new(statement);
                tracing::debug!(tier = matcher.tier().as_str(), sql = %query, "extracted query");
                return Extraction::Query { query, tier: matcher.tier() };
            }
        }

        if !text.to_uppercase().contains("SELECT") {
            tracing::debug!("no SQL in model response, treating it as a direct answer");
            return Extraction::DirectAnswer(text.to_string());
        }

        tracing::warn!("failed to extract query from model response");
        Extraction::NoQueryFound {
            reason: "response mentions SELECT but contains neither a ```sql block \
                     nor a statement terminated by ';'"
                .to_string(),
        }
    }
}

impl Default for QueryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract with the default matcher order
pub fn extract_query(raw: &RawModelResponse) -> Extraction {
    QueryExtractor::new().extract(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> Extraction {
        extract_query(&RawModelResponse::new(text))
    }

    fn query_of(extraction: Extraction) -> (String, ExtractionTier) {
        match extraction {
            Extraction::Query { query, tier } => (query.into_inner(), tier),
            other => panic!("Expected a query, got {:?}", other),
        }
    }

    #[test]
    fn fenced_block_is_captured_and_terminated() {
        let (sql, tier) = query_of(extract("```sql\nSELECT COUNT(*) FROM orders\n```"));
        assert_eq!(sql, "SELECT COUNT(*) FROM orders;");
        assert_eq!(tier, ExtractionTier::FencedBlock);
    }

    #[test]
    fn fenced_block_ignores_surrounding_prose() {
        let raw = "Here is the query you asked for:\n\n```SQL\n  SELECT name\n  FROM customers\n  WHERE id = 1;\n```\n\nLet me know if you need more.";
        let (sql, _) = query_of(extract(raw));
        assert_eq!(sql, "SELECT name\n  FROM customers\n  WHERE id = 1;");
    }

    #[test]
    fn fenced_block_wins_over_earlier_bare_statement() {
        let raw = "Maybe SELECT 1; but really:\n```sql\nSELECT 2\n```";
        let (sql, tier) = query_of(extract(raw));
        assert_eq!(sql, "SELECT 2;");
        assert_eq!(tier, ExtractionTier::FencedBlock);
    }

    #[test]
    fn first_of_several_fences_wins() {
        let raw = "```sql\nSELECT 1\n```\nor\n```sql\nSELECT 2\n```";
        let (sql, _) = query_of(extract(raw));
        assert_eq!(sql, "SELECT 1;");
    }

    #[test]
    fn fenced_non_select_statement_is_not_rejected() {
        let (sql, _) = query_of(extract("```sql\nDELETE FROM orders\n```"));
        assert_eq!(sql, "DELETE FROM orders;");
    }

    #[test]
    fn empty_fence_falls_through_to_bare_statement() {
        let raw = "```sql\n```\nSELECT id FROM users;";
        let (sql, tier) = query_of(extract(raw));
        assert_eq!(sql, "SELECT id FROM users;");
        assert_eq!(tier, ExtractionTier::BareStatement);
    }

    #[test]
    fn bare_statement_is_returned_unchanged() {
        let raw = "The query is SELECT SUM(line_total) FROM sales WHERE customer = 'Jaxbean Group'; hope that helps";
        let (sql, tier) = query_of(extract(raw));
        assert_eq!(sql, "SELECT SUM(line_total) FROM sales WHERE customer = 'Jaxbean Group';");
        assert_eq!(tier, ExtractionTier::BareStatement);
    }

    #[test]
    fn bare_statement_is_case_insensitive_and_multiline() {
        let raw = "select id\nfrom users\nwhere active;";
        let (sql, _) = query_of(extract(raw));
        assert_eq!(sql, "select id\nfrom users\nwhere active;");
    }

    #[test]
    fn bare_statement_stops_at_first_terminator() {
        let raw = "SELECT 1; SELECT 2;";
        let (sql, _) = query_of(extract(raw));
        assert_eq!(sql, "SELECT 1;");
    }

    #[test]
    fn unlabeled_fence_is_not_a_fenced_block() {
        let raw = "```\nSELECT 1;\n```";
        let (sql, tier) = query_of(extract(raw));
        assert_eq!(sql, "SELECT 1;");
        assert_eq!(tier, ExtractionTier::BareStatement);
    }

    #[test]
    fn text_without_select_is_a_direct_answer() {
        let raw = "Sorry, I can't help with that.";
        assert_eq!(extract(raw), Extraction::DirectAnswer(raw.to_string()));
    }

    #[test]
    fn direct_answer_preserves_whitespace() {
        let raw = "  There are no tables about weather.\n";
        assert_eq!(extract(raw), Extraction::DirectAnswer(raw.to_string()));
    }

    #[test]
    fn unterminated_select_is_no_query_found() {
        let result = extract("SELECT COUNT(*) FROM orders");
        assert!(matches!(result, Extraction::NoQueryFound { .. }));
    }

    #[test]
    fn select_mentioned_in_prose_without_statement_is_no_query_found() {
        let result = extract("I would need to select from a table you don't have");
        match result {
            Extraction::NoQueryFound { reason } => assert!(reason.contains("SELECT")),
            other => panic!("Expected NoQueryFound, got {:?}", other),
        }
    }

    #[test]
    fn custom_matcher_order() {
        let extractor = QueryExtractor::with_matchers(vec![
            Box::new(BareStatementMatcher),
            Box::new(FencedBlockMatcher),
        ]);
        let raw = RawModelResponse::new("SELECT 1;\n```sql\nSELECT 2\n```");
        let (sql, tier) = query_of(extractor.extract(&raw));
        assert_eq!(sql, "SELECT 1;");
        assert_eq!(tier, ExtractionTier::BareStatement);
    }

    #[test]
    fn matchers_report_not_found() {
        assert_eq!(FencedBlockMatcher.find("no fences here"), MatchResult::NotFound);
        assert_eq!(BareStatementMatcher.find("SELECT without end"), MatchResult::NotFound);
    }
}
