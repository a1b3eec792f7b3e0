//! Unified error types for cinedex.
//!
//! None of these reach the caller of the public analytics or poster operations;
//! they surface only from the lower-level store API and from tool parameter checks.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the cinedex core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input (e.g., an event document that is not a JSON object).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The log store could not be reached.
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),

    /// A log store round-trip exceeded its deadline.
    #[error("STORE_TIMEOUT: {0}")]
    StoreTimeout(String),

    /// A document could not be encoded or decoded.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),

    /// Filesystem error.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32020, e.to_string()),
            Error::MigrationFailed(msg) => (-32020, msg.clone()),
            Error::StoreUnavailable(msg) => (-32021, msg.clone()),
            Error::StoreTimeout(msg) => (-32022, msg.clone()),
            Error::Serialization(msg) => (-32023, msg.clone()),
            Error::Io(e) => (-32024, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
