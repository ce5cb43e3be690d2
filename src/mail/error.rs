//! Errors reported by a mail gateway.

use thiserror::Error;

/// Errors that can occur while talking to the remote mail service.
///
/// Carried inside engine events, so it is `Clone` and holds only strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Network or connection failure.
    #[error("network error: {0}")]
    Transport(String),

    /// Credentials were rejected or are missing.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service asked us to slow down.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The thread no longer exists remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status.
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A thread reference pointed at an account that is not configured.
    #[error("invalid account index {0}")]
    InvalidAccount(usize),

    /// The operation has no remote counterpart.
    #[error("{0}")]
    Unsupported(String),
}

impl GatewayError {
    /// Classify an HTTP status code returned by the service.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            _ => Self::Http { status, message },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
