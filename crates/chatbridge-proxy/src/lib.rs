//! chatbridge proxy - OpenAI-compatible HTTP front for the chatbridge adapter.
//!
//! Clients speak OpenAI's `/v1/chat/completions` API. This crate exposes that
//! surface over Actix Web and hands each request to a [`ChatService`], which
//! runs the core pipeline against the configured backend.
//!
//! Configuration comes from environment variables, an optional
//! `chatbridge.yml`, and command line flags, in increasing precedence.

pub mod config;
pub mod server;
pub mod service;

pub use config::{BackendKind, BridgeConfig};
pub use server::{cors, cors_headers, routes, serve, ApiError, AppState};
pub use service::{build_backend, ChatService};
