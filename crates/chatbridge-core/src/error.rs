//! Adapter failures and their OpenAI-style error envelopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way a chat completion request can fail.
///
/// The set is closed: each kind renders a distinct `code` so client tooling
/// can tell validation failures apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("{0}")]
    MalformedBody(String),

    #[error("Missing required parameter: messages")]
    MissingMessages,

    #[error("messages must be an array")]
    InvalidMessagesType,

    #[error("messages array cannot be empty")]
    EmptyMessages,

    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Internal(String),

    #[error("Route {0} not found")]
    RouteNotFound(String),
}

impl AdapterError {
    /// Body could not be decoded as JSON at all.
    pub fn invalid_json() -> Self {
        Self::MalformedBody("Invalid JSON in request body".to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedBody(_)
            | Self::MissingMessages
            | Self::InvalidMessagesType
            | Self::EmptyMessages => 400,
            Self::RouteNotFound(_) => 404,
            Self::Backend(_) | Self::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Backend(_) | Self::Internal(_) => "internal_error",
            _ => "invalid_request_error",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) => "invalid_json",
            Self::MissingMessages => "missing_messages",
            Self::InvalidMessagesType => "invalid_messages_type",
            Self::EmptyMessages => "empty_messages",
            Self::Backend(_) => "backend_error",
            Self::Internal(_) => "internal_error",
            Self::RouteNotFound(_) => "route_not_found",
        }
    }

    pub fn param(&self) -> Option<&'static str> {
        match self {
            Self::MissingMessages | Self::InvalidMessagesType | Self::EmptyMessages => {
                Some("messages")
            }
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: self.to_string(),
                kind: self.error_type().to_string(),
                param: self.param().map(str::to_string),
                code: self.code().to_string(),
            },
        }
    }
}

/// `{"error": {...}}` as returned by the OpenAI API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub param: Option<String>,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_kinds_render_distinct_codes() {
        let kinds = [
            AdapterError::invalid_json(),
            AdapterError::MissingMessages,
            AdapterError::InvalidMessagesType,
            AdapterError::EmptyMessages,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(AdapterError::code).collect();
        assert_eq!(codes.len(), 4);
        assert!(kinds.iter().all(|k| k.status_code() == 400));
        assert!(kinds.iter().all(|k| k.error_type() == "invalid_request_error"));
    }

    #[test]
    fn empty_messages_envelope_shape() {
        let value = serde_json::to_value(AdapterError::EmptyMessages.to_envelope()).unwrap();
        assert_eq!(
            value,
            json!({
                "error": {
                    "message": "messages array cannot be empty",
                    "type": "invalid_request_error",
                    "param": "messages",
                    "code": "empty_messages"
                }
            })
        );
    }

    #[test]
    fn backend_error_surfaces_message_only() {
        let err = AdapterError::Backend("upstream timed out".to_string());
        let envelope = err.to_envelope();
        assert_eq!(err.status_code(), 500);
        assert_eq!(envelope.error.message, "upstream timed out");
        assert_eq!(envelope.error.kind, "internal_error");
        assert_eq!(envelope.error.code, "backend_error");
        assert!(envelope.error.param.is_none());
        assert!(!err.is_client_error());
    }

    #[test]
    fn malformed_body_has_null_param() {
        let value = serde_json::to_value(AdapterError::invalid_json().to_envelope()).unwrap();
        assert_eq!(value["error"]["param"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], "invalid_json");
        assert_eq!(value["error"]["message"], "Invalid JSON in request body");
    }
}
