//! Unified error type.

use thiserror::Error;

/// The error type returned by wisp's fallible operations.
///
/// Application-level errors (404, 422, etc.) are written to the
/// [`ResponseWriter`](crate::ResponseWriter), not returned as `Error`s. This
/// type surfaces registration failures at startup and infrastructure failures
/// while serving: binding to a port or accepting a connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("invalid method token `{0}`")]
    InvalidMethod(String),

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// The host pattern facility already holds a pattern that overlaps this one.
    #[error("pattern `{pattern}` conflicts with an existing registration: {source}")]
    Conflict {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },
}
