//! Scoring provider error types.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure category reported with every provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Auth,
    Quota,
    Network,
    Malformed,
    Timeout,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Network => "network",
            Self::Malformed => "malformed",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn quota(msg: impl Into<String>) -> Self {
        Self::Quota(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Auth(_) => ProviderErrorKind::Auth,
            Self::Quota(_) => ProviderErrorKind::Quota,
            Self::Network(_) => ProviderErrorKind::Network,
            Self::Malformed(_) => ProviderErrorKind::Malformed,
            Self::Timeout(_) => ProviderErrorKind::Timeout,
        }
    }

    /// Only transient network failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Auth and quota failures will not clear up within a run.
    pub fn disables_provider(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Quota(_))
    }

    /// Map a non-success HTTP status to an error kind.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let msg = format!("{}: {}", status, truncate(body, 200));
        match status.as_u16() {
            401 | 403 => Self::Auth(msg),
            402 | 429 => Self::Quota(msg),
            408 => Self::Network(msg),
            s if s >= 500 => Self::Network(msg),
            _ => Self::Malformed(msg),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status, "")
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProviderError::from_status(StatusCode::UNAUTHORIZED, "").kind(), ProviderErrorKind::Auth);
        assert_eq!(ProviderError::from_status(StatusCode::FORBIDDEN, "").kind(), ProviderErrorKind::Auth);
        assert_eq!(ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "").kind(), ProviderErrorKind::Quota);
        assert_eq!(ProviderError::from_status(StatusCode::PAYMENT_REQUIRED, "").kind(), ProviderErrorKind::Quota);
        assert_eq!(ProviderError::from_status(StatusCode::BAD_GATEWAY, "").kind(), ProviderErrorKind::Network);
        assert_eq!(ProviderError::from_status(StatusCode::BAD_REQUEST, "").kind(), ProviderErrorKind::Malformed);
    }

    #[test]
    fn test_only_network_is_retryable() {
        assert!(ProviderError::network("reset").is_retryable());
        assert!(!ProviderError::auth("bad key").is_retryable());
        assert!(!ProviderError::quota("limit").is_retryable());
        assert!(!ProviderError::malformed("junk").is_retryable());
        assert!(!ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
