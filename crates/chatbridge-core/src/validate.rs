//! Inbound schema validation.
//!
//! Only the top-level shape is enforced, in a fixed order:
//! body is a JSON object, `messages` is present, is an array, is non-empty.
//! Everything past that is read leniently and falls back to defaults.

use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::types::{ChatMessage, CompletionRequest};

/// Validate a raw request body.
pub fn validate_body(body: &[u8]) -> Result<CompletionRequest, AdapterError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "request body is not valid JSON");
        AdapterError::invalid_json()
    })?;
    validate_value(&value)
}

/// Validate an already decoded request body.
pub fn validate_value(value: &Value) -> Result<CompletionRequest, AdapterError> {
    let obj = value.as_object().ok_or_else(|| {
        AdapterError::MalformedBody("Request body must be a JSON object".to_string())
    })?;

    let messages = match obj.get("messages") {
        None | Some(Value::Null) => return Err(AdapterError::MissingMessages),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AdapterError::InvalidMessagesType),
    };
    if messages.is_empty() {
        return Err(AdapterError::EmptyMessages);
    }

    Ok(CompletionRequest {
        messages: messages.iter().map(ChatMessage::from_value).collect(),
        model: obj.get("model").and_then(Value::as_str).map(str::to_string),
        temperature: number(obj, "temperature").unwrap_or(CompletionRequest::DEFAULT_TEMPERATURE),
        max_tokens: obj
            .get("max_tokens")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(CompletionRequest::DEFAULT_MAX_TOKENS),
        stream: obj.get("stream").and_then(Value::as_bool).unwrap_or(false),
        top_p: number(obj, "top_p"),
        frequency_penalty: number(obj, "frequency_penalty"),
        presence_penalty: number(obj, "presence_penalty"),
    })
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}
