use fragments_types::FragmentKey;

/// Errors from metadata and data store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested payload does not exist.
    #[error("not found: {0}")]
    NotFound(FragmentKey),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored name or value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored record exists but its raw bytes are unreadable.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: FragmentKey, reason: String },

    /// The backend failed for a reason other than I/O (e.g. a poisoned lock
    /// or a remote service rejecting the request).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
