//! Config file loading and its effect on a running app.

use std::fs;
use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::Value;
use tempfile::TempDir;

use chatbridge_core::BackendModel;
use chatbridge_proxy::{cors, cors_headers, routes, AppState, BackendKind, BridgeConfig, ChatService};

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("chatbridge.yml");
    fs::write(&path, content).unwrap();
    path
}

#[::core::prelude::v1::test]
fn explicit_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
server:
  host: 127.0.0.1
  port: 8123
  max_body_bytes: 4096
backend:
  kind: stub
  base_url: http://localhost:9999
  request_timeout_secs: 5
routing:
  default_model: llama
"#,
    );

    let config = BridgeConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.bind_addr(), "127.0.0.1:8123");
    assert_eq!(config.max_body_bytes, 4096);
    assert_eq!(config.backend, BackendKind::Stub);
    assert_eq!(config.live.base_url, "http://localhost:9999");
    assert_eq!(config.live.timeout_secs, 5);
    assert_eq!(config.default_model, BackendModel::Llama);
}

#[::core::prelude::v1::test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = BridgeConfig::load(Some(dir.path().join("absent.yml").as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config file"));
}

#[::core::prelude::v1::test]
fn unknown_model_in_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "routing:\n  default_model: mistral\n");
    let err = BridgeConfig::from_yaml_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[actix_web::test]
async fn file_routing_rules_reach_the_app() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
routing:
  default_model: gemini
  rules:
    - pattern: "opus"
      model: claude
"#,
    );
    let config = BridgeConfig::from_yaml_file(&path)
        .unwrap()
        .with_overrides(None, None, Some(BackendKind::Stub));
    let service = ChatService::from_config(&config).unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(
                Arc::new(service),
                config.max_body_bytes,
            )))
            .wrap(cors_headers())
            .wrap(cors())
            .configure(routes),
    )
    .await;

    for (caller, expected) in [
        ("claude-opus-4", "claude-3-5-sonnet"),
        ("OPUS", "claude-3-5-sonnet"),
        ("gpt-4o", "gemini-2.0-flash"),
        ("deepseek-r1", "deepseek-chat"),
    ] {
        let payload = serde_json::json!({
            "model": caller,
            "messages": [{"role": "user", "content": "Hi"}]
        });
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/v1/chat/completions")
                .set_payload(payload.to_string())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["model"], expected, "caller model: {caller}");
    }
}
