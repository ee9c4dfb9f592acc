//! Conversation log carried between completion requests.

use serde::{Deserialize, Serialize};

/// Instruction that seeds every conversation.
pub const SYSTEM_INSTRUCTION: &str = "you are a linux command interpreter that converts the user's natural language request to the closest and most accurate unix (linux) command only, nothing extra. if the request does not resemble a command simply say not a command. output only the command every time, no instructions nor explanations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered message log that always starts with exactly one system message.
///
/// The log can only grow through [`Conversation::push`] and only shrink
/// through [`Conversation::reset`] or [`Conversation::truncate`], neither of
/// which can remove the system message.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a log seeded with [`SYSTEM_INSTRUCTION`].
    pub fn new() -> Self {
        Self::with_instruction(SYSTEM_INSTRUCTION)
    }

    pub fn with_instruction(instruction: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::System, instruction)],
        }
    }

    /// Appends a user or assistant turn. System messages are only ever the seed.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        debug_assert!(role != Role::System, "system message is fixed");
        self.messages.push(Message::new(role, content));
    }

    /// Drops every turn, keeping only the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Rolls the log back to `len` messages (never below the system message).
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; the system message is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
