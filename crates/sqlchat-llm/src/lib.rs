//! Language-model collaborator for the question-to-answer pipeline
//!
//! A model here is anything that turns a prompt (plus optional stop
//! sequences) into generated text. Two implementations ship:
//! - [`GeminiModel`] - Google Gemini over its REST API
//! - [`ScriptedModel`] - replays canned responses, for tests and demos

pub mod model;
pub mod gemini;
pub mod scripted;

pub use model::{LanguageModel, ModelError};
pub use gemini::GeminiModel;
pub use scripted::{ScriptedModel, RecordedCall};
