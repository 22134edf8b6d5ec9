//! The chat completion pipeline, independent of HTTP.
//!
//! validate -> flatten -> route -> invoke -> usage -> compose

use std::sync::Arc;

use anyhow::{Context, Result};
use chatbridge_core::{
    flatten, validate_body, AdapterError, CompletionRequest, CompletionResponse, ModelRouter,
    ResponseComposer, UsageEstimator,
};
use chatbridge_providers::{BackendInvoker, BackendRequest, LiveBackend, StubGenerator};
use tracing::{debug, error, info};

use crate::config::{BackendKind, BridgeConfig};

pub struct ChatService {
    router: ModelRouter,
    composer: ResponseComposer,
    usage: UsageEstimator,
    backend: Arc<dyn BackendInvoker>,
}

impl ChatService {
    pub fn new(backend: Arc<dyn BackendInvoker>) -> Self {
        Self {
            router: ModelRouter::default(),
            composer: ResponseComposer::new(),
            usage: UsageEstimator,
            backend,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Ok(Self::new(build_backend(config)?).with_router(config.router()))
    }

    pub fn with_router(mut self, router: ModelRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_composer(mut self, composer: ResponseComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    /// Run the whole pipeline on a raw request body.
    pub async fn complete_body(&self, body: &[u8]) -> Result<CompletionResponse, AdapterError> {
        let request = validate_body(body)?;
        self.complete(&request).await
    }

    /// Run the pipeline on an already validated request.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AdapterError> {
        let context = flatten(&request.messages);
        let model = self.router.route(request.model.as_deref());
        debug!(
            caller_model = request.model.as_deref().unwrap_or("-"),
            backend_model = model.id(),
            messages = request.messages.len(),
            "routing decision"
        );
        if request.stream {
            debug!("stream requested; replying with a single completion");
        }

        let backend_request = BackendRequest::new(context, model, request);
        let reply = self.backend.invoke(&backend_request).await.map_err(|e| {
            error!(
                error = %e,
                backend = self.backend.name(),
                timeout = e.is_timeout(),
                "backend invocation failed"
            );
            AdapterError::Backend(e.to_string())
        })?;

        if reply.content.trim().is_empty() {
            error!(backend = self.backend.name(), "backend returned no text");
            return Err(AdapterError::Backend(
                "backend returned an empty completion".to_string(),
            ));
        }

        let usage = self
            .usage
            .resolve(reply.usage, &backend_request.context, &reply.content);
        let response = self.composer.compose(model, reply.content, usage);

        info!(
            id = %response.id,
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion served"
        );
        Ok(response)
    }
}

/// Build the backend named by the configuration.
pub fn build_backend(config: &BridgeConfig) -> Result<Arc<dyn BackendInvoker>> {
    let backend: Arc<dyn BackendInvoker> = match config.backend {
        BackendKind::Stub => Arc::new(StubGenerator::new()),
        BackendKind::Live => Arc::new(
            LiveBackend::new(config.live.clone()).context("failed to build the live backend")?,
        ),
    };
    Ok(backend)
}
