//! chatbridge core - the OpenAI chat completion translation layer.
//!
//! Callers speak OpenAI's `/v1/chat/completions` API. Generation happens on a
//! backend with its own request shape and model names. This crate holds the
//! pure, I/O-free half of that translation:
//! - validating the inbound body ([`validate`]),
//! - flattening the conversation ([`flatten`]),
//! - routing caller model names to backend ids ([`routing`]),
//! - approximating token usage ([`usage`]),
//! - composing the response envelope ([`compose`]),
//! - rendering failures as OpenAI error envelopes ([`error`]).
//!
//! Backend calls live in `chatbridge-providers`; the HTTP surface lives in
//! `chatbridge-proxy`.

pub mod compose;
pub mod error;
pub mod flatten;
pub mod routing;
pub mod types;
pub mod usage;
pub mod validate;

pub use compose::ResponseComposer;
pub use error::{AdapterError, ErrorBody, ErrorEnvelope};
pub use flatten::{flatten, FlattenedContext, FALLBACK_USER_CONTENT};
pub use routing::{BackendModel, ModelRouter, RoutingRule};
pub use types::{
    ChatMessage, Choice, CompletionRequest, CompletionResponse, ResponseMessage, Role, Usage,
};
pub use usage::{estimate_tokens, ReportedUsage, UsageEstimator};
pub use validate::{validate_body, validate_value};
