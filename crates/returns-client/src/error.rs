//! Error types for the decorated client

/// Errors surfaced to callers of the decorated client.
///
/// Non-auth HTTP failures are not errors: the caller gets the buffered
/// response back with whatever status the backend chose. Only transport
/// failures and the two terminal auth conditions land here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connect, DNS, timeout). Transient: nothing
    /// about the session changed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The replayed request was rejected again. Terminal for this one
    /// request; the stored credentials are left untouched.
    #[error("request unauthorized after credential renewal: {0}")]
    Unauthorized(String),

    /// Renewal failed, so the session is over. The store has been cleared
    /// and the session-ended event broadcast; the host must log in again.
    #[error("reauthentication required: {0}")]
    ReauthRequired(String),

    /// JSON body encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(String),

    /// Failure from a direct auth operation (login, store access).
    #[error("auth operation failed: {0}")]
    Auth(#[from] returns_auth::Error),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
