//! Error types for dosekit-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dosekit-core
///
/// Path resolution never fails; these errors only come from building
/// contexts out of external data.
#[derive(Debug, Error)]
pub enum Error {
    /// The data used to build a context is not an object
    #[error("Invalid context: expected an object, got {0}")]
    InvalidContext(&'static str),

    /// Malformed JSON input
    #[error("Invalid context JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
