//! In-memory conversation session
//!
//! A [`Conversation`] is the uncommitted sequence of turns since the last
//! reset or save. It always starts with the assistant greeting and only
//! grows until the pipeline commits it to the transcript.

use serde::{Deserialize, Serialize};

use crate::prompt::GREETING;

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Render messages into the flat history form consumed by the prompts,
/// the transcript and the summarizer: one `"<role>: <content>;\n "` block
/// per message, in order.
pub fn render_history(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        out.push_str(&format!("{}: {};\n ", message.role, message.content));
    }
    out
}

/// The open, uncommitted session
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a fresh session with the assistant greeting
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
        }
    }

    /// Append a turn
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All turns so far, in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Discard everything and return to the greeting
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(GREETING));
    }

    /// Flat rendering of the whole session
    pub fn history_text(&self) -> String {
        render_history(&self.messages)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_greets() {
        let convo = Conversation::new();
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0], Message::assistant(GREETING));
    }

    #[test]
    fn test_history_rendering_order() {
        let mut convo = Conversation::new();
        convo.push(Message::user("Remind me to buy milk"));
        convo.push(Message::assistant("Sure!"));

        assert_eq!(
            convo.history_text(),
            "assistant: Hi there!;\n user: Remind me to buy milk;\n assistant: Sure!;\n "
        );
    }

    #[test]
    fn test_reset_returns_to_greeting() {
        let mut convo = Conversation::new();
        convo.push(Message::user("hello"));
        convo.reset();
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].role, Role::Assistant);
    }
}
