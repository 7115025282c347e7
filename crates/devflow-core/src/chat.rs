use crate::types::Sender;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reply appended when the model call behind a chat turn fails.
pub const APOLOGY: &str = "Sorry, I encountered an error.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4().simple()),
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }
}

/// Append a message to a conversation. Conversations are append-only.
pub fn append(messages: &mut Vec<ChatMessage>, message: ChatMessage) -> &ChatMessage {
    messages.push(message);
    &messages[messages.len() - 1]
}

/// Render a transcript as `User: ...` / `Model: ...` lines.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.prompt_label(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
