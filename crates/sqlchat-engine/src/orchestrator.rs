//! Per-question pipeline
//!
//! One call to [`Orchestrator::answer`] walks the stages below exactly once
//! and always ends with a single [`FinalAnswer`] unless a fatal error stops
//! it:
//!
//! ```text
//! Generating -> Extracting -> DirectAnswer
//!                          -> ExtractionFailed
//!                          -> Executing -> ExecutionFailed
//!                                       -> Synthesizing -> Done
//! ```
//!
//! Model failures and an unreachable database while describing the schema
//! are fatal and returned as [`PipelineError`]. Everything else becomes the
//! answer text.

use crate::error::PipelineError;
use crate::executor::QueryExecutor;
use crate::extractor::{Extraction, QueryExtractor};
use crate::generator::QueryGenerator;
use crate::prompts::PromptTemplates;
use crate::synthesizer::AnswerSynthesizer;
use serde::Serialize;
use sqlchat_catalog::Database;
use sqlchat_core::{ExecutionResult, ExtractedQuery, FinalAnswer, Question, RawModelResponse};
use sqlchat_llm::LanguageModel;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer given when the model mentioned SQL but no statement could be isolated
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "I'm sorry, I couldn't generate a valid SQL query for that question.";

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generating,
    Extracting,
    DirectAnswer,
    ExtractionFailed,
    Executing,
    ExecutionFailed,
    Synthesizing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Generating => "generating",
            Stage::Extracting => "extracting",
            Stage::DirectAnswer => "direct_answer",
            Stage::ExtractionFailed => "extraction_failed",
            Stage::Executing => "executing",
            Stage::ExecutionFailed => "execution_failed",
            Stage::Synthesizing => "synthesizing",
            Stage::Done => "done",
        }
    }

    /// Whether the pipeline stops in this stage
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Stage::DirectAnswer | Stage::ExtractionFailed | Stage::ExecutionFailed | Stage::Done
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one orchestration call produced
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Text shown to the user
    pub answer: FinalAnswer,

    /// Stage the call ended in
    pub terminal: Stage,

    /// Model output from the generation step
    pub raw_response: RawModelResponse,

    /// Statement that was executed (or attempted)
    pub query: Option<ExtractedQuery>,

    /// Serialized result, when execution succeeded
    pub result: Option<ExecutionResult>,
}

impl Outcome {
    fn new(answer: impl Into<String>, terminal: Stage, raw_response: RawModelResponse) -> Self {
        Self {
            answer: FinalAnswer::new(answer),
            terminal,
            raw_response,
            query: None,
            result: None,
        }
    }
}

/// Sequences schema description, generation, extraction, execution and
/// synthesis for each question
///
/// The database and model are shared by every call; create one
/// orchestrator at startup and reuse it.
pub struct Orchestrator {
    db: Arc<dyn Database>,
    generator: QueryGenerator,
    extractor: QueryExtractor,
    executor: QueryExecutor,
    synthesizer: AnswerSynthesizer,
}

impl Orchestrator {
    /// Orchestrator with the built-in prompts and matcher order
    pub fn new(db: Arc<dyn Database>, model: Arc<dyn LanguageModel>) -> Result<Self, PipelineError> {
        Ok(Self::with_parts(db, model, PromptTemplates::new()?, QueryExtractor::new()))
    }

    /// Orchestrator with custom prompts or matchers
    pub fn with_parts(
        db: Arc<dyn Database>,
        model: Arc<dyn LanguageModel>,
        prompts: PromptTemplates,
        extractor: QueryExtractor,
    ) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            generator: QueryGenerator::new(Arc::clone(&model), Arc::clone(&prompts)),
            executor: QueryExecutor::new(Arc::clone(&db)),
            synthesizer: AnswerSynthesizer::new(model, prompts),
            extractor,
            db,
        }
    }

    /// Answer one question
    #[tracing::instrument(name = "orchestrator.answer", skip_all, fields(question = %question))]
    pub async fn answer(&self, question: &Question) -> Result<Outcome, PipelineError> {
        let schema = self.db.describe_schema().await?;
        debug!(tables = schema.tables.len(), "schema described");

        debug!(stage = %Stage::Generating);
        let raw = self.generator.generate_sql(question, &schema).await?;

        debug!(stage = %Stage::Extracting);
        let (query, tier) = match self.extractor.extract(&raw) {
            Extraction::Query { query, tier } => (query, tier),
            Extraction::DirectAnswer(text) => {
                info!(stage = %Stage::DirectAnswer, "model answered without SQL");
                return Ok(Outcome::new(text, Stage::DirectAnswer, raw));
            }
            Extraction::NoQueryFound { reason } => {
                warn!(stage = %Stage::ExtractionFailed, %reason, "no query extracted");
                return Ok(Outcome::new(EXTRACTION_FAILED_MESSAGE, Stage::ExtractionFailed, raw));
            }
        };

        debug!(stage = %Stage::Executing, tier = tier.as_str(), sql = %query);
        let result = match self.executor.execute(&query).await {
            Ok(result) => result,
            Err(e) => {
                warn!(stage = %Stage::ExecutionFailed, error = %e, "query execution failed");
                let mut outcome = Outcome::new(execution_failed_message(&e), Stage::ExecutionFailed, raw);
                outcome.query = Some(query);
                return Ok(outcome);
            }
        };

        debug!(stage = %Stage::Synthesizing);
        let answer = self.synthesizer.synthesize(question, &query, &result).await?;

        info!(stage = %Stage::Done, "question answered");
        Ok(Outcome {
            answer,
            terminal: Stage::Done,
            raw_response: raw,
            query: Some(query),
            result: Some(result),
        })
    }
}

fn execution_failed_message(error: &impl std::fmt::Display) -> String {
    format!("I encountered an error while running the query. Error: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::DirectAnswer.is_terminal());
        assert!(Stage::ExtractionFailed.is_terminal());
        assert!(Stage::ExecutionFailed.is_terminal());
        assert!(!Stage::Generating.is_terminal());
        assert!(!Stage::Synthesizing.is_terminal());
    }

    #[test]
    fn execution_failure_message_embeds_error() {
        assert_eq!(
            execution_failed_message(&"relation \"foo\" does not exist"),
            "I encountered an error while running the query. Error: relation \"foo\" does not exist"
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::ExecutionFailed.to_string(), "execution_failed");
    }
}
