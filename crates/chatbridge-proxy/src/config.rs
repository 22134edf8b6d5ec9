//! Configuration from environment variables and chatbridge.yml.
//!
//! Environment variables give the base configuration:
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `PORT`: server port (default: 3000)
//! - `CHATBRIDGE_BACKEND`: `stub` or `live` (default: stub)
//! - `PUTER_API_URL`: live backend base URL (default: https://api.puter.com)
//! - `PUTER_AUTH_TOKEN`: live backend credential
//! - `REQUEST_TIMEOUT_SECS`: backend request timeout (default: 120)
//! - `MAX_BODY_BYTES`: request body limit (default: 2 MiB)
//!
//! An optional YAML file overrides them:
//!
//! ```yaml
//! server:
//!   port: 8080
//! backend:
//!   kind: live
//!   prompt_mode: last_user_message
//! routing:
//!   default_model: gpt
//!   rules:
//!     - pattern: "sonnet"
//!       model: claude
//! ```
//!
//! The credential is only ever read from the environment.

use anyhow::{bail, Context, Result};
use chatbridge_core::{BackendModel, ModelRouter, RoutingRule};
use chatbridge_providers::{LiveBackendConfig, PromptMode, SecretString, DEFAULT_BASE_URL};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAMES: &[&str] = &["chatbridge.yml", "chatbridge.yaml", ".chatbridge.yml"];
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Which [`BackendInvoker`](chatbridge_providers::BackendInvoker) to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Stub,
    Live,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stub" => Some(Self::Stub),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub backend: BackendKind,
    pub live: LiveBackendConfig,
    pub default_model: BackendModel,
    pub routing_rules: Vec<RoutingRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server: ServerSection,
    backend: BackendSection,
    routing: RoutingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    max_body_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BackendSection {
    kind: Option<BackendKind>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    prompt_mode: Option<PromptMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoutingSection {
    default_model: Option<BackendModel>,
    rules: Vec<RoutingRule>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl BridgeConfig {
    /// Build the base configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let live_defaults = LiveBackendConfig::default();

        Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(3000),
            max_body_bytes: parsed(&lookup, "MAX_BODY_BYTES").unwrap_or(DEFAULT_MAX_BODY_BYTES),
            backend: lookup("CHATBRIDGE_BACKEND")
                .and_then(|v| BackendKind::parse(&v))
                .unwrap_or_default(),
            live: LiveBackendConfig {
                base_url: lookup("PUTER_API_URL")
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                auth_token: lookup("PUTER_AUTH_TOKEN")
                    .filter(|t| !t.trim().is_empty())
                    .map(SecretString::from),
                timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS").unwrap_or(live_defaults.timeout_secs),
                prompt_mode: live_defaults.prompt_mode,
            },
            default_model: BackendModel::default(),
            routing_rules: Vec::new(),
        }
    }

    /// Load configuration: an explicit path must exist; otherwise the first
    /// file found in the standard locations is used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = Self::default();
        match explicit {
            Some(path) => base.merge_yaml_file(path),
            None => match find_config_file() {
                Some(path) => {
                    tracing::info!(path = %path.display(), "using config file");
                    base.merge_yaml_file(&path)
                }
                None => Ok(base),
            },
        }
    }

    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::default().merge_yaml_file(&path.into())
    }

    pub fn merge_yaml_file(self, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        self.merge_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn merge_yaml_str(mut self, content: &str) -> Result<Self> {
        let file: FileConfig = if content.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml_ng::from_str(content)?
        };

        if let Some(host) = file.server.host {
            self.host = host;
        }
        if let Some(port) = file.server.port {
            self.port = port;
        }
        if let Some(limit) = file.server.max_body_bytes {
            self.max_body_bytes = limit;
        }
        if let Some(kind) = file.backend.kind {
            self.backend = kind;
        }
        if let Some(base_url) = file.backend.base_url {
            self.live.base_url = base_url;
        }
        if let Some(timeout) = file.backend.request_timeout_secs {
            self.live.timeout_secs = timeout;
        }
        if let Some(mode) = file.backend.prompt_mode {
            self.live.prompt_mode = mode;
        }
        if let Some(model) = file.routing.default_model {
            self.default_model = model;
        }
        self.routing_rules.extend(file.routing.rules);

        Ok(self)
    }

    /// Apply command line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        backend: Option<BackendKind>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::Live && self.live.auth_token.is_none() {
            bail!("the live backend needs PUTER_AUTH_TOKEN to be set");
        }
        if self.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than zero");
        }
        if self.live.timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn router(&self) -> ModelRouter {
        ModelRouter::new()
            .with_rules(self.routing_rules.iter().cloned())
            .with_default(self.default_model)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Look for a config file in the working directory, then in
/// `~/.config/chatbridge/`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILE_NAMES.iter().map(PathBuf::from);
    let user = dirs::home_dir().into_iter().flat_map(|home| {
        CONFIG_FILE_NAMES
            .iter()
            .map(move |name| home.join(".config").join("chatbridge").join(name))
    });

    local.chain(user).find(|path| path.is_file())
}
