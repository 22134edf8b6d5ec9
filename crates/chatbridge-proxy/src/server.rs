//! Actix Web HTTP server.
//!
//! Exposes OpenAI-compatible endpoints:
//! - `POST /v1/chat/completions`
//! - `GET /` and `GET /health`
//!
//! `OPTIONS` on any path is answered as a CORS preflight. Everything else is
//! a 404 error envelope.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    http::{header::ContentType, Method, StatusCode},
    middleware::DefaultHeaders,
    web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use anyhow::{Context, Result};
use chatbridge_core::AdapterError;
use futures::{FutureExt, StreamExt};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::BridgeConfig;
use crate::service::ChatService;

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const SERVICE_NAME: &str = "chatbridge";
const PREFLIGHT_MAX_AGE: &str = "86400";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChatService>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(service: Arc<ChatService>, max_body_bytes: usize) -> Self {
        Self {
            service,
            max_body_bytes,
        }
    }
}

/// Renders an [`AdapterError`] as its JSON error envelope.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AdapterError);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.0.to_envelope())
    }
}

pub async fn serve(config: BridgeConfig) -> Result<()> {
    config.validate()?;

    let service = Arc::new(ChatService::from_config(&config)?);
    let state = web::Data::new(AppState::new(service, config.max_body_bytes));
    let addr = config.bind_addr();
    info!(
        addr = %addr,
        backend = state.service.backend_name(),
        default_model = %state.service.router().default_model(),
        "chatbridge-proxy listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_headers())
            .wrap(cors())
            .configure(routes)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

/// CORS for browser callers. Preflights fall through to the routes so they
/// get the same `204` everywhere.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .disable_preflight()
}

/// Method and header allow-lists for every response, preflights included.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add((
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, X-Requested-With",
        ))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(health))
            .default_service(web::to(fallback)),
    )
    .service(
        web::resource("/health")
            .route(web::get().to(health))
            .default_service(web::to(fallback)),
    )
    .service(
        web::resource(CHAT_COMPLETIONS_PATH)
            .route(web::post().to(chat_completions))
            .default_service(web::to(fallback)),
    )
    .default_service(web::to(fallback));
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "online",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.service.backend_name(),
        "endpoints": {
            "health": "/",
            "chat": CHAT_COMPLETIONS_PATH,
        },
        "message": "Bridge is running successfully!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn chat_completions(
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let body = read_body(payload, state.max_body_bytes).await?;

    let outcome = AssertUnwindSafe(state.service.complete_body(&body))
        .catch_unwind()
        .await;
    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            if e.is_client_error() {
                debug!(code = e.code(), error = %e, "rejected request");
            }
            return Err(e.into());
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(error = %message, "completion handler panicked");
            return Err(AdapterError::Internal(message).into());
        }
    };

    let bytes = serde_json::to_vec(&response).map_err(|e| {
        error!(error = %e, "failed to serialize completion");
        AdapterError::Internal(e.to_string())
    })?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(bytes))
}

async fn fallback(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(HttpResponse::NoContent()
            .insert_header(("Access-Control-Max-Age", PREFLIGHT_MAX_AGE))
            .finish());
    }
    debug!(method = %req.method(), path = req.path(), "no route");
    Err(AdapterError::RouteNotFound(req.path().to_string()).into())
}

/// Read the whole body, refusing anything over `limit` bytes.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::Bytes, AdapterError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            debug!(error = %e, "failed to read request body");
            AdapterError::MalformedBody(format!("Failed to read request body: {}", e))
        })?;
        if body.len() + chunk.len() > limit {
            return Err(AdapterError::MalformedBody(format!(
                "Request body exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Internal server error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_status_follows_kind() {
        assert_eq!(
            ApiError(AdapterError::EmptyMessages).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AdapterError::RouteNotFound("/x".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(AdapterError::Backend("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn panic_message_reads_str_and_string() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "Internal server error");
    }
}
