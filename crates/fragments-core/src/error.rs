use fragments_types::FragmentKey;
use thiserror::Error;

/// A field failed validation during construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// The offending field, as named in the serialized record.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] fragments_store::StoreError),

    /// A stored metadata record could not be read back as a fragment.
    #[error("corrupt metadata record {key}: {reason}")]
    CorruptRecord { key: FragmentKey, reason: String },

    /// At least one side of a delete failed. Each field holds that side's
    /// error, if any.
    #[error("delete of {key} incomplete (data: {}, metadata: {})",
        .data.as_deref().unwrap_or("ok"),
        .metadata.as_deref().unwrap_or("ok"))]
    DeleteIncomplete {
        key: FragmentKey,
        data: Option<String>,
        metadata: Option<String>,
    },
}

pub type FragmentResult<T> = Result<T, FragmentError>;
