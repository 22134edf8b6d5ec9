//! Provider error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("backend returned an empty completion")]
    EmptyCompletion,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}
