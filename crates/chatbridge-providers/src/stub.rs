//! Deterministic stand-in backend.

use async_trait::async_trait;

use crate::traits::{BackendInvoker, BackendReply, BackendRequest, ProviderResult};

/// Echoes the most recent user message back without any network call.
///
/// Output depends only on the request, so the same conversation always gets
/// the same reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubGenerator;

impl StubGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, request: &BackendRequest) -> String {
        let mut text = format!(
            "I understand you said: \"{}\"\n\n\
             This reply comes from the chatbridge stub backend. \
             Your request was accepted in OpenAI format and routed to {}.",
            request.context.last_user_content,
            request.model.id(),
        );
        if request.context.has_system_prompt() {
            text.push_str(&format!(
                "\n\nA system prompt of {} characters was applied.",
                request.context.system_prompt.chars().count()
            ));
        }
        text
    }
}

#[async_trait]
impl BackendInvoker for StubGenerator {
    async fn invoke(&self, request: &BackendRequest) -> ProviderResult<BackendReply> {
        Ok(BackendReply::text(self.render(request)))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::{flatten, BackendModel, ChatMessage, CompletionRequest};

    fn request(messages: Vec<ChatMessage>) -> BackendRequest {
        let completion = CompletionRequest::new(messages);
        BackendRequest::new(flatten(&completion.messages), BackendModel::Gpt, &completion)
    }

    #[test]
    fn echoes_latest_user_message() {
        let text = StubGenerator.render(&request(vec![
            ChatMessage::user("first"),
            ChatMessage::user("second"),
        ]));
        assert!(text.contains("\"second\""));
        assert!(!text.contains("\"first\""));
        assert!(text.contains("gpt-4o-mini"));
        assert!(!text.contains("system prompt"));
    }

    #[test]
    fn mentions_system_prompt() {
        let text = StubGenerator.render(&request(vec![
            ChatMessage::system("abc"),
            ChatMessage::user("hi"),
        ]));
        assert!(text.contains("system prompt of 3 characters"));
    }

    #[test]
    fn is_deterministic() {
        let req = request(vec![ChatMessage::user("same")]);
        assert_eq!(StubGenerator.render(&req), StubGenerator.render(&req));
    }

    #[tokio::test]
    async fn invoke_never_reports_usage() {
        let reply = StubGenerator
            .invoke(&request(vec![ChatMessage::assistant("no user here")]))
            .await
            .unwrap();
        assert!(reply.content.contains("\"Hello\""));
        assert!(reply.usage.is_none());
    }
}
