//! Language model trait

/// Errors returned by a model invocation
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ModelError {
    /// Whether the service could not be reached or refused our credentials
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ModelError::AuthenticationError(_) | ModelError::NetworkError(_)
        )
    }
}

/// A text-completion service
///
/// One instance is created at startup and shared by every orchestration
/// call.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Get the backend name (e.g., "Gemini")
    fn name(&self) -> &'static str;

    /// Generate text for a prompt
    ///
    /// Generation halts before any of the `stop` sequences would be emitted;
    /// the returned text never contains them.
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, ModelError>;
}

/// Cut `text` before the earliest occurrence of any stop sequence
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[&str]) -> &'a str {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s))
        .min();

    match cut {
        Some(idx) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_at_earliest_stop_sequence() {
        let text = "SELECT 1;\nSQLResult: 1\nAnswer: one";
        assert_eq!(truncate_at_stop(text, &["\nAnswer:", "\nSQLResult:"]), "SELECT 1;");
        assert_eq!(truncate_at_stop(text, &[]), text);
        assert_eq!(truncate_at_stop(text, &[""]), text);
    }

    #[test]
    fn connectivity_classification() {
        assert!(ModelError::NetworkError("timed out".into()).is_connectivity());
        assert!(ModelError::AuthenticationError("bad key".into()).is_connectivity());
        assert!(!ModelError::RateLimited("quota".into()).is_connectivity());
        assert!(!ModelError::InvalidResponse("no candidates".into()).is_connectivity());
    }
}
