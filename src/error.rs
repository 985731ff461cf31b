//! Upstream boundary errors.

use thiserror::Error;

/// Failure talking to the upstream chat-completions service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Status code to propagate to the local client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::Network(_) => 500,
        }
    }

    /// Message for the local client's `{"error": ...}` payload.
    pub fn message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Network(e) => e.to_string(),
        }
    }
}
