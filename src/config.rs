//! Configuration from environment variables, loaded once at process start.
//!
//! **Environment variables:**
//! - `PORT`: server port (default: 17924)
//! - `OPENAI_API_URL`: base URL of the upstream API (default: https://api.openai.com/v1)
//! - `OPENAI_API_KEY`: bearer credential forwarded upstream (default: empty)
//! - `DEFAULT_MODEL`: model used when a request does not name one (default: gpt-3.5-turbo)
//! - `REQUEST_TIMEOUT_SECS`: upstream request timeout (default: 300)

use std::env;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub upstream_base_url: String,
    /// Forwarded as-is in the `Authorization: Bearer` header. Never logged.
    pub api_key: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(17924),
            upstream_base_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            default_model: env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl ProxyConfig {
    pub fn upstream_base_trimmed(&self) -> String {
        self.upstream_base_url.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slashes_from_upstream_base() {
        let config = ProxyConfig {
            port: 17924,
            upstream_base_url: "https://api.openai.com/v1///".to_string(),
            api_key: String::new(),
            default_model: "gpt-3.5-turbo".to_string(),
            request_timeout_secs: 300,
        };

        assert_eq!(config.upstream_base_trimmed(), "https://api.openai.com/v1");
    }
}
