//! Question-to-answer pipeline
//!
//! This crate handles:
//! - Rendering the SQL generation and answer synthesis prompts
//! - Isolating a single SQL statement from free-text model output
//! - Executing it and turning failures into user-visible answers
//! - Sequencing all of the above per question ([`Orchestrator`])

pub mod error;
pub mod prompts;
pub mod extractor;
pub mod generator;
pub mod executor;
pub mod synthesizer;
pub mod orchestrator;

pub use error::PipelineError;
pub use prompts::{PromptTemplates, SQL_GENERATION_TEMPLATE, ANSWER_SYNTHESIS_TEMPLATE};
pub use extractor::{
    extract_query, BareStatementMatcher, Extraction, ExtractionTier, FencedBlockMatcher, MatchResult,
    QueryExtractor, QueryMatcher,
};
pub use generator::{QueryGenerator, SQL_RESULT_STOP};
pub use executor::{ExecutionError, QueryExecutor};
pub use synthesizer::AnswerSynthesizer;
pub use orchestrator::{Orchestrator, Outcome, Stage, EXTRACTION_FAILED_MESSAGE};
