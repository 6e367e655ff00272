//! Scripted model for testing
//!
//! Replays a fixed sequence of responses, one per call, and records every
//! prompt it receives. Stop sequences are honored the same way a real
//! service honors them: the text is cut before the first stop sequence.
//!
//! ```rust,ignore
//! let model = ScriptedModel::new()
//!     .respond("```sql\nSELECT COUNT(*) FROM orders\n```")
//!     .respond("There are 42 orders.");
//!
//! let sql = model.complete("...", &["\nSQLResult:"]).await?;
//! assert_eq!(model.calls().len(), 1);
//! ```

use crate::model::{truncate_at_stop, LanguageModel, ModelError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A prompt the scripted model received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub stop: Vec<String>,
}

/// Model that replays canned responses in order
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    responses: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failed invocation
    pub fn fail(self, error: ModelError) -> Self {
        self.push(Err(error))
    }

    fn push(self, entry: Result<String, ModelError>) -> Self {
        lock(&self.responses).push_back(entry);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

/// Lock a mutex, recovering the data if a panicking test poisoned it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, ModelError> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            stop: stop.iter().map(|s| s.to_string()).collect(),
        });

        let next = lock(&self.responses).pop_front().ok_or_else(|| {
            ModelError::InvalidResponse("scripted model has no responses left".to_string())
        })?;

        next.map(|text| truncate_at_stop(&text, stop).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order() {
        let model = ScriptedModel::new().respond("first").respond("second");

        assert_eq!(model.complete("a", &[]).await.unwrap(), "first");
        assert_eq!(model.complete("b", &[]).await.unwrap(), "second");
        assert!(model.complete("c", &[]).await.is_err());

        let prompts: Vec<String> = model.calls().into_iter().map(|c| c.prompt).collect();
        assert_eq!(prompts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn honors_stop_sequences() {
        let model = ScriptedModel::new().respond("SELECT 1;\nSQLResult: 1");
        let text = model.complete("q", &["\nSQLResult:"]).await.unwrap();
        assert_eq!(text, "SELECT 1;");
        assert_eq!(model.calls()[0].stop, vec!["\nSQLResult:".to_string()]);
    }

    #[tokio::test]
    async fn replays_failures() {
        let model = ScriptedModel::new().fail(ModelError::NetworkError("unreachable".into()));
        let err = model.complete("q", &[]).await.unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(model.remaining(), 0);
    }
}
