//! Fetch engine error types.

use std::sync::Arc;

/// Why a single request attempt failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttemptError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Response arrived with a non-2xx status.
    #[error("HTTP {status}")]
    Status { status: u16 },
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { AttemptError::Timeout } else { AttemptError::Network(Arc::new(err)) }
    }
}

/// Failure of a whole [`Fetcher::fetch`](super::Fetcher::fetch) call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be normalized; no request was issued.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The fetcher itself could not be built.
    #[error("invalid fetch configuration: {0}")]
    Config(String),

    /// Every attempt failed.
    #[error("failed to fetch {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: AttemptError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_display() {
        let err = FetchError::Exhausted {
            url: "https://example.com/works/1".into(),
            attempts: 3,
            last: AttemptError::Status { status: 503 },
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/works/1"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("HTTP 503"));
    }
}
