//! OpenAI chat completion wire types.
//!
//! Notes:
//! - Inbound messages are read leniently (see [`ChatMessage::from_value`]) so
//!   that odd message content never fails a request on its own.
//! - Outbound types mirror the OpenAI `chat.completion` object exactly,
//!   including the always-null `logprobs`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message role. Unknown roles are preserved but carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(other) => other,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// A single conversation message, reduced to its role and plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Read a message out of an arbitrary JSON value.
    ///
    /// A missing or blank role means `user`; a role that is not a string is
    /// inert. Non-object values become an inert message with an empty role,
    /// which the flattener skips.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::new(Role::Other(String::new()), String::new());
        };

        let role = match obj.get("role") {
            None | Some(Value::Null) => Role::User,
            Some(Value::String(role)) if role.trim().is_empty() => Role::User,
            Some(Value::String(role)) => Role::from(role.as_str()),
            Some(_) => Role::Other(String::new()),
        };

        Self {
            role,
            content: content_text(obj.get("content")),
        }
    }
}

/// Plain text of a `content` field: a string, an array of parts, or a single
/// `{ "text": ... }` object. Non-text parts (images, audio) are dropped.
fn content_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts.iter().filter_map(part_text).collect(),
        Some(Value::Object(map)) => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
    }
}

fn part_text(part: &Value) -> Option<&str> {
    match part {
        Value::String(text) => Some(text),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    }
}

/// A validated `/v1/chat/completions` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

impl CompletionRequest {
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    /// Build a request with default sampling parameters.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            stream: false,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }
}

/// Response body for `/v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    pub system_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub logprobs: Option<Value>,
    pub finish_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    pub content: String,
}

/// Token usage info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Counts are widened so `total_tokens` is always the exact sum.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        let prompt_tokens = u64::from(prompt_tokens);
        let completion_tokens = u64::from(completion_tokens);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_round_trips_unknown_values() {
        let role: Role = serde_json::from_value(json!("developer")).unwrap();
        assert_eq!(role, Role::Other("developer".to_string()));
        assert_eq!(serde_json::to_value(&role).unwrap(), json!("developer"));
    }

    #[test]
    fn message_without_role_defaults_to_user() {
        let msg = ChatMessage::from_value(&json!({"content": "hey"}));
        assert_eq!(msg, ChatMessage::user("hey"));
    }

    #[test]
    fn blank_role_is_user_and_non_string_role_is_inert() {
        let msg = ChatMessage::from_value(&json!({"role": "", "content": "empty"}));
        assert_eq!(msg, ChatMessage::user("empty"));
        let msg = ChatMessage::from_value(&json!({"role": null, "content": "null"}));
        assert_eq!(msg, ChatMessage::user("null"));

        let msg = ChatMessage::from_value(&json!({"role": 5, "content": "number"}));
        assert_eq!(msg.role, Role::Other(String::new()));
        assert_eq!(msg.content, "number");
    }

    #[test]
    fn message_content_parts_are_concatenated() {
        let msg = ChatMessage::from_value(&json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "look at "},
                {"type": "image_url", "image_url": {"url": "https://x/y.png"}},
                {"type": "text", "text": "this"}
            ]
        }));
        assert_eq!(msg.content, "look at this");
    }

    #[test]
    fn non_object_message_is_inert() {
        let msg = ChatMessage::from_value(&json!(42));
        assert_eq!(msg.role, Role::Other(String::new()));
        assert!(msg.content.is_empty());

        let msg = ChatMessage::from_value(&json!({"role": "user", "content": null}));
        assert_eq!(msg, ChatMessage::user(""));
    }

    #[test]
    fn usage_total_is_sum() {
        let usage = Usage::new(3, 4);
        assert_eq!(usage.total_tokens, 7);

        let large = Usage::new(3_000_000_000, 3_000_000_000);
        assert_eq!(large.total_tokens, 6_000_000_000);
        assert_eq!(large.total_tokens, large.prompt_tokens + large.completion_tokens);
    }
}
