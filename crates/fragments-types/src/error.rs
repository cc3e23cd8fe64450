use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("owner id must not be empty")]
    EmptyOwnerId,

    #[error("fragment id must not be empty")]
    EmptyFragmentId,

    #[error("{kind} is {len} bytes, longer than the {max}-byte limit")]
    IdTooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid media type {value:?}: {reason}")]
    InvalidMediaType { value: String, reason: String },

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
}
