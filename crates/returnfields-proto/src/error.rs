//! Protocol error types.

use thiserror::Error;

/// Wire-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The request parameter container could not be read.
    #[error("request context is missing")]
    MissingRequestContext,

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
