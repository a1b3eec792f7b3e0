//! TMDB client error types.

use std::sync::Arc;

/// Errors from the TMDB API client.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    /// No TMDB API key configured.
    #[error("missing API key: CINEDEX_TMDB_API_KEY not set")]
    MissingApiKey,

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by TMDB.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TmdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TmdbError::Timeout } else { TmdbError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TmdbError::MissingApiKey;
        assert!(err.to_string().contains("API key"));

        let err = TmdbError::HttpError { status: 503 };
        assert_eq!(err.to_string(), "HTTP error: 503");
    }
}
