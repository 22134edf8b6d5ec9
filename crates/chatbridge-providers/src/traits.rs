//! Backend invoker trait

use async_trait::async_trait;
use chatbridge_core::{BackendModel, CompletionRequest, FlattenedContext, ReportedUsage};

use crate::ProviderError;

/// Result type for backend operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Normalized request handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub context: FlattenedContext,
    pub model: BackendModel,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

impl BackendRequest {
    pub fn new(context: FlattenedContext, model: BackendModel, request: &CompletionRequest) -> Self {
        Self {
            context,
            model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
        }
    }
}

/// Generated text, plus exact token counts when the backend reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub content: String,
    pub usage: Option<ReportedUsage>,
}

impl BackendReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Anything that can turn a [`BackendRequest`] into generated text.
#[async_trait]
pub trait BackendInvoker: Send + Sync {
    /// Run one completion. No retries.
    async fn invoke(&self, request: &BackendRequest) -> ProviderResult<BackendReply>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
