//! Error types for the Brain.fm API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Brain.fm service.
#[derive(Debug, Error)]
pub enum BrainfmError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    ///
    /// Brain.fm reports domain conditions through bare transport statuses
    /// (e.g. 404 for an unknown station id); operations with a registered
    /// error template translate those into a
    /// [`StructuredError`](crate::types::StructuredError) instead.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually empty or a short HTML page.
        body: String,
    },

    /// The caller supplied parameters the operation does not declare.
    /// Raised before any network I/O.
    #[error("unexpected parameters: {}", .0.join(", "))]
    UnexpectedParameters(Vec<String>),

    /// The caller omitted required parameters. Raised before any network I/O.
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    /// The fetched signing-key map has no entry for an operation's wire name.
    ///
    /// This signals that the local operation catalogue is stale relative to
    /// the remote service (an operation was renamed or removed server-side).
    #[error("no signing key for operation {0:?}")]
    UnknownSigningKey(String),

    /// A 2xx response body did not parse as JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// File I/O error (session read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (session file handling).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. missing config directory,
    /// unexpected login response shape).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for `Result<T, BrainfmError>`.
pub type Result<T> = std::result::Result<T, BrainfmError>;
