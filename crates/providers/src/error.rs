//! Provider error classification

use thiserror::Error;

/// Error from a model provider, classified for retry decisions.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimit, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Server, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }

    /// Map a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail: String = body.trim().chars().take(800).collect();
        let message = if detail.is_empty() {
            format!("gemini error: {}", status)
        } else {
            format!("gemini error: {}\n{}", status, detail)
        };
        if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
            return Self::rate_limit(message);
        }
        match status {
            401 | 403 => Self::auth(message),
            500..=599 => Self::server(message),
            _ => Self::unknown(message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 429 / RESOURCE_EXHAUSTED - retried with backoff
    RateLimit,
    /// 401, 403
    Auth,
    /// 5xx
    Server,
    /// Connection or body read failure
    Network,
    /// Payload we could not decode
    InvalidResponse,
    Unknown,
}

impl ProviderErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

/// Drops the request URL from the message before it can reach a log.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() || e.is_connect() {
            ProviderError::network(format!("request failed: {}", e))
        } else if e.is_decode() {
            ProviderError::invalid_response(format!("failed to decode response: {}", e))
        } else {
            ProviderError::unknown(format!("request failed: {}", e))
        }
    }
}
