//! Helpers for reading backend replies and error bodies.
//!
//! The backend's own error shape is not part of our contract; we only try to
//! pull a human-readable message out of it.

use chatbridge_core::ReportedUsage;
use serde_json::Value;

/// Best-effort message from an error body.
///
/// Looks at `error.message`, `error` (string), then `message`; falls back to
/// the raw text, or a generic message when the body is empty.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = message_from_value(&value) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn message_from_value(value: &Value) -> Option<String> {
    let error = value.get("error");
    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

/// Completion text from a driver `result` object.
///
/// Accepts `message.content` as a string or a list of text parts, then
/// `content`, `text`, or a bare string `message`.
pub fn completion_text(result: &Value) -> Option<String> {
    let message = result.get("message");
    let content = message
        .and_then(|m| m.get("content"))
        .or_else(|| result.get("content"))
        .or_else(|| result.get("text"))
        .or(message.filter(|m| m.is_string()));

    match content? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.as_str()),
                    other => other.get("text").and_then(Value::as_str),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Exact token counts from `result.usage`, if the backend reported them.
///
/// Two shapes are understood: an object with `prompt_tokens`/`input_tokens`
/// and `completion_tokens`/`output_tokens`, or a list of
/// `{ "type": "prompt" | "completion", "amount": n }` entries.
pub fn reported_usage(result: &Value) -> Option<ReportedUsage> {
    match result.get("usage")? {
        Value::Object(map) => {
            let count = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_u64))
                    .and_then(|n| u32::try_from(n).ok())
            };
            Some(ReportedUsage {
                prompt_tokens: count(&["prompt_tokens", "input_tokens"])?,
                completion_tokens: count(&["completion_tokens", "output_tokens"])?,
            })
        }
        Value::Array(entries) => {
            let amount = |kind: &str| {
                entries
                    .iter()
                    .filter(|e| e.get("type").and_then(Value::as_str) == Some(kind))
                    .filter_map(|e| e.get("amount").and_then(Value::as_u64))
                    .sum::<u64>()
            };
            let prompt = amount("prompt");
            let completion = amount("completion");
            if prompt == 0 && completion == 0 {
                return None;
            }
            Some(ReportedUsage {
                prompt_tokens: u32::try_from(prompt).ok()?,
                completion_tokens: u32::try_from(completion).ok()?,
            })
        }
        _ => None,
    }
}
