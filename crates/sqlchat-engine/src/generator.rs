//! SQL generation model call

use crate::error::PipelineError;
use crate::prompts::PromptTemplates;
use sqlchat_core::{Question, RawModelResponse, SchemaDescription};
use sqlchat_llm::LanguageModel;
use std::sync::Arc;

/// Stop sequence that keeps the model from inventing a result block
pub const SQL_RESULT_STOP: &str = "\nSQLResult:";

/// Asks the model for a SQL statement answering a question
pub struct QueryGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Arc<PromptTemplates>,
}

impl QueryGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Arc<PromptTemplates>) -> Self {
        Self { model, prompts }
    }

    /// Returns the model output verbatim; extraction happens later
    #[tracing::instrument(skip_all, fields(model = self.model.name()))]
    pub async fn generate_sql(
        &self,
        question: &Question,
        schema: &SchemaDescription,
    ) -> Result<RawModelResponse, PipelineError> {
        let prompt = self.prompts.sql_generation(&schema.render(), question.as_str())?;
        let text = self.model.complete(&prompt, &[SQL_RESULT_STOP]).await?;

        tracing::debug!(response = %text, "model returned SQL candidate");
        Ok(RawModelResponse::new(text))
    }
}
