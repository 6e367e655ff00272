//! Conversation history owned by the UI session
//!
//! The pipeline never reads or mutates this; the chat front end appends the
//! user's question and the final answer after each turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting every new conversation starts with
pub const GREETING: &str = "Hi! How can I help you with your database today?";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only ordered sequence of messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Start a conversation seeded with the assistant greeting
    pub fn new() -> Self {
        Self {
            messages: vec![Message::new(Role::Assistant, GREETING)],
        }
    }

    /// Start a conversation with no messages
    pub fn empty() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize the transcript as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_starts_with_greeting() {
        let history = ConversationHistory::new();
        assert_eq!(history.len(), 1);
        assert_eq!(history.messages()[0].role, Role::Assistant);
        assert_eq!(history.messages()[0].content, GREETING);
    }

    #[test]
    fn messages_are_appended_in_order() {
        let mut history = ConversationHistory::empty();
        history.push_user("How many orders?");
        history.push_assistant("There are 42 orders.");

        let roles: Vec<Role> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(history.messages()[1].content, "There are 42 orders.");
    }

    #[test]
    fn transcript_json_roundtrip() {
        let mut history = ConversationHistory::new();
        history.push_user("hello");

        let json = history.to_json().unwrap();
        assert!(json.contains("\"role\": \"user\""));

        let parsed: ConversationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
