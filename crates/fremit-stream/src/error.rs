//! Stream error types.

use thiserror::Error;

/// Errors raised while building pipelines.
///
/// Delivery itself never fails: stages either pass a value on, hold it
/// back, or panic, and panics are left to the caller of `emit`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A field path expression could not be parsed.
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath {
        /// The offending path expression.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl StreamError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
