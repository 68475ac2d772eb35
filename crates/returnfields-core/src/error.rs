//! Core error types.

use thiserror::Error;

/// Restriction engine errors.
///
/// Only [`Error::Configuration`] ever reaches callers of the engine; the other
/// variants are produced by collaborators and absorbed by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid restriction configuration. Raised at construction time only.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A schema provider could not describe a record type.
    #[error("unknown record type: {0}")]
    UnknownRecordType(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] returnfields_proto::Error),
}
