//! Conversation flattening.
//!
//! Backends that take a single prompt need the message list reduced to text:
//! system instructions are pulled out on their own, user and assistant turns
//! become a `User:` / `Assistant:` transcript.

use serde::Serialize;

use crate::types::{ChatMessage, Role};

/// Used as the prompt when the conversation has no usable user turn.
pub const FALLBACK_USER_CONTENT: &str = "Hello";

/// Result of flattening a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenedContext {
    /// All system contents in order, newline-joined.
    pub system_prompt: String,
    /// `User: ...` / `Assistant: ...` lines in order, newline-joined.
    pub transcript: String,
    /// Content of the most recent user message.
    pub last_user_content: String,
}

impl FlattenedContext {
    /// Text the prompt side of token usage is estimated from.
    pub fn prompt_text(&self) -> String {
        format!("{}{}", self.system_prompt, self.transcript)
    }

    pub fn has_system_prompt(&self) -> bool {
        !self.system_prompt.is_empty()
    }
}

pub fn flatten(messages: &[ChatMessage]) -> FlattenedContext {
    let mut system_parts = Vec::new();
    let mut lines = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.as_str()),
            Role::User => lines.push(format!("User: {}", msg.content)),
            Role::Assistant => lines.push(format!("Assistant: {}", msg.content)),
            Role::Other(_) => {}
        }
    }

    FlattenedContext {
        system_prompt: system_parts.join("\n"),
        transcript: lines.join("\n"),
        last_user_content: last_user_content(messages),
    }
}

fn last_user_content(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|msg| msg.role == Role::User)
        .map(|msg| msg.content.as_str())
        .filter(|content| !content.is_empty())
        .unwrap_or(FALLBACK_USER_CONTENT)
        .to_string()
}
