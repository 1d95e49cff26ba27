//! Error types for credential storage and auth endpoint operations

/// Errors from credential storage and auth endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("credentials rejected: {0}")]
    Rejected(String),

    #[error("auth endpoint failure: {0}")]
    Endpoint(String),

    #[error("credential store I/O error: {0}")]
    Io(String),

    #[error("credential store parse error: {0}")]
    Parse(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
