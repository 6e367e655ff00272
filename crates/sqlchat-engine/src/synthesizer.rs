//! Answer synthesis model call

use crate::error::PipelineError;
use crate::prompts::PromptTemplates;
use sqlchat_core::{ExecutionResult, ExtractedQuery, FinalAnswer, Question};
use sqlchat_llm::LanguageModel;
use std::sync::Arc;

/// Turns a question, its query and the query result into prose
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    prompts: Arc<PromptTemplates>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Arc<PromptTemplates>) -> Self {
        Self { model, prompts }
    }

    /// Model output is returned unmodified
    #[tracing::instrument(skip_all, fields(model = self.model.name()))]
    pub async fn synthesize(
        &self,
        question: &Question,
        query: &ExtractedQuery,
        result: &ExecutionResult,
    ) -> Result<FinalAnswer, PipelineError> {
        let prompt = self
            .prompts
            .answer_synthesis(question.as_str(), query.as_str(), result.as_str())?;
        let text = self.model.complete(&prompt, &[]).await?;
        Ok(FinalAnswer::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlchat_llm::{ModelError, ScriptedModel};

    fn synthesizer(model: &ScriptedModel) -> AnswerSynthesizer {
        AnswerSynthesizer::new(Arc::new(model.clone()), Arc::new(PromptTemplates::new().unwrap()))
    }

    #[tokio::test]
    async fn embeds_inputs_and_returns_output_verbatim() {
        let model = ScriptedModel::new().respond("  There are 42 orders.\n");
        let answer = synthesizer(&model)
            .synthesize(
                &Question::new("How many orders?"),
                &ExtractedQuery::new("SELECT COUNT(*) FROM orders;"),
                &ExecutionResult::new("42"),
            )
            .await
            .unwrap();

        assert_eq!(answer.as_str(), "  There are 42 orders.\n");

        let calls = model.calls();
        assert!(calls[0].stop.is_empty());
        assert!(calls[0].prompt.contains("Original Question: How many orders?"));
        assert!(calls[0].prompt.contains("SQL Query: SELECT COUNT(*) FROM orders;"));
        assert!(calls[0].prompt.contains("SQL Result: 42"));
    }

    #[tokio::test]
    async fn model_failure_is_fatal() {
        let model = ScriptedModel::new().fail(ModelError::RateLimited("quota".into()));
        let err = synthesizer(&model)
            .synthesize(
                &Question::new("q"),
                &ExtractedQuery::new("SELECT 1;"),
                &ExecutionResult::new("[(1,)]"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Model(ModelError::RateLimited(_))));
    }
}
