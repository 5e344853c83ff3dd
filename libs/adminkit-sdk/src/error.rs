use adminkit_auth::StorageError;
use adminkit_http::HttpError;
use thiserror::Error;

/// Error surfaced by every SDK operation.
///
/// `Display` is the short, user-facing message: the server's `message`
/// field when it sent one, otherwise an operation-specific fallback such as
/// "Failed to load ledger".
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// No bearer token is stored; the request was not sent.
    #[error("No token: log in first")]
    NoCredentials,

    /// Input rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status {
        status: http::StatusCode,
        message: String,
    },

    /// Network failure, timeout or undecodable response body.
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: HttpError,
    },

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The store was closed; no further requests are made through it.
    #[error("Store is closed")]
    Closed,
}

impl ApiError {
    /// Classify an HTTP-layer failure, preferring the server's message over
    /// `fallback`.
    #[must_use]
    pub fn from_http(err: HttpError, fallback: &str) -> Self {
        match err {
            HttpError::MissingCredentials => Self::NoCredentials,
            HttpError::HttpStatus { status, .. } => {
                let message = err.server_message().unwrap_or_else(|| fallback.to_owned());
                Self::Status { status, message }
            }
            other => Self::Transport {
                message: fallback.to_owned(),
                source: other,
            },
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status of a server rejection, if that is what this is.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
