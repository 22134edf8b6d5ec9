//! Live backend: the Puter driver API.
//!
//! Requests go to `POST {base_url}/drivers/call` as a
//! `puter-chat-completion` / `complete` driver call. The reply carries the
//! completion under `result`; usage is optional.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::response_handling::{completion_text, error_message, message_from_value, reported_usage};
use crate::traits::{BackendInvoker, BackendReply, BackendRequest, ProviderResult};
use crate::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api.puter.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DRIVER_INTERFACE: &str = "puter-chat-completion";
const DRIVER_METHOD: &str = "complete";

/// What the backend is asked to complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// The whole flattened `User:` / `Assistant:` transcript.
    #[default]
    Transcript,
    /// Only the most recent user message.
    LastUserMessage,
}

#[derive(Debug, Clone)]
pub struct LiveBackendConfig {
    pub base_url: String,
    pub auth_token: Option<SecretString>,
    pub timeout_secs: u64,
    pub prompt_mode: PromptMode,
}

impl Default for LiveBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prompt_mode: PromptMode::default(),
        }
    }
}

impl LiveBackendConfig {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_prompt_mode(mut self, prompt_mode: PromptMode) -> Self {
        self.prompt_mode = prompt_mode;
        self
    }
}

/// Puter driver API client
pub struct LiveBackend {
    client: Client,
    endpoint: String,
    prompt_mode: PromptMode,
}

impl LiveBackend {
    pub fn new(config: LiveBackendConfig) -> Result<Self, ProviderError> {
        let token = config.auth_token.as_ref().ok_or_else(|| {
            ProviderError::Configuration("auth token required for the live backend".into())
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token.expose_secret())
                .parse()
                .map_err(|_| ProviderError::Configuration("Invalid auth token format".into()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/drivers/call", config.base_url.trim_end_matches('/')),
            prompt_mode: config.prompt_mode,
        })
    }

    fn build_request<'a>(&self, request: &'a BackendRequest) -> DriverCall<'a> {
        let ctx = &request.context;
        let mut messages = Vec::with_capacity(2);
        if ctx.has_system_prompt() {
            messages.push(DriverMessage {
                role: "system",
                content: &ctx.system_prompt,
            });
        }
        let prompt = match self.prompt_mode {
            PromptMode::Transcript if !ctx.transcript.is_empty() => &ctx.transcript,
            _ => &ctx.last_user_content,
        };
        messages.push(DriverMessage {
            role: "user",
            content: prompt,
        });

        DriverCall {
            interface: DRIVER_INTERFACE,
            service: request.model.service(),
            method: DRIVER_METHOD,
            args: DriverArgs {
                messages,
                model: request.model.id(),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                top_p: request.top_p,
                frequency_penalty: request.frequency_penalty,
                presence_penalty: request.presence_penalty,
            },
        }
    }

    fn convert_response(body: Value) -> ProviderResult<BackendReply> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = message_from_value(&body).unwrap_or_else(|| "unknown error".to_string());
            return Err(ProviderError::Rejected(message));
        }

        let result = body.get("result").unwrap_or(&body);
        let content = completion_text(result).ok_or_else(|| {
            ProviderError::InvalidResponse("no completion text in backend reply".into())
        })?;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }

        Ok(BackendReply {
            content,
            usage: reported_usage(result),
        })
    }
}

#[async_trait]
impl BackendInvoker for LiveBackend {
    async fn invoke(&self, request: &BackendRequest) -> ProviderResult<BackendReply> {
        let call = self.build_request(request);
        tracing::debug!(
            service = call.service,
            model = call.args.model,
            "calling backend driver"
        );

        let response = self.client.post(&self.endpoint).json(&call).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Self::convert_response(body)
    }

    fn name(&self) -> &str {
        "live"
    }
}

// API request types
#[derive(Debug, Serialize)]
struct DriverCall<'a> {
    interface: &'static str,
    service: &'static str,
    method: &'static str,
    args: DriverArgs<'a>,
}

#[derive(Debug, Serialize)]
struct DriverArgs<'a> {
    messages: Vec<DriverMessage<'a>>,
    model: &'static str,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
}

#[derive(Debug, Serialize)]
struct DriverMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::{flatten, BackendModel, ChatMessage, CompletionRequest};
    use serde_json::json;

    fn backend(mode: PromptMode) -> LiveBackend {
        LiveBackend::new(
            LiveBackendConfig::default()
                .with_token("secret")
                .with_base_url("http://localhost:9/")
                .with_prompt_mode(mode),
        )
        .unwrap()
    }

    fn request() -> BackendRequest {
        let mut completion = CompletionRequest::new(vec![
            ChatMessage::system("be kind"),
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
        ]);
        completion.top_p = Some(0.5);
        BackendRequest::new(flatten(&completion.messages), BackendModel::Claude, &completion)
    }

    #[test]
    fn requires_token() {
        let err = LiveBackend::new(LiveBackendConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(backend(PromptMode::Transcript).endpoint, "http://localhost:9/drivers/call");
    }

    #[test]
    fn transcript_mode_payload() {
        let req = request();
        let value = serde_json::to_value(backend(PromptMode::Transcript).build_request(&req)).unwrap();
        assert_eq!(
            value,
            json!({
                "interface": "puter-chat-completion",
                "service": "claude",
                "method": "complete",
                "args": {
                    "messages": [
                        {"role": "system", "content": "be kind"},
                        {"role": "user", "content": "User: one\nAssistant: two\nUser: three"}
                    ],
                    "model": "claude-3-5-sonnet",
                    "temperature": 0.7,
                    "max_tokens": 1000,
                    "top_p": 0.5
                }
            })
        );
    }

    #[test]
    fn last_user_mode_sends_only_latest_turn() {
        let req = request();
        let value =
            serde_json::to_value(backend(PromptMode::LastUserMessage).build_request(&req)).unwrap();
        assert_eq!(value["args"]["messages"][1]["content"], "three");
    }

    #[test]
    fn rejected_reply_is_an_error() {
        let err = LiveBackend::convert_response(json!({
            "success": false,
            "error": {"message": "insufficient funds"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "backend rejected the request: insufficient funds");
    }

    #[test]
    fn blank_reply_is_unusable() {
        let err = LiveBackend::convert_response(json!({
            "success": true,
            "result": {"message": {"content": "   "}}
        }))
        .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyCompletion));
    }
}
