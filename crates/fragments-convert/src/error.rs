//! Error types for the conversion crate.

use fragments_types::SupportedType;

/// Reasons a requested conversion is refused or fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The requested extension is not in the extension table.
    #[error("unknown extension: .{0}")]
    UnknownExtension(String),

    /// Image to non-image, or non-image to image.
    #[error("cannot convert {from} to {to}: different content families")]
    CrossFamily {
        from: SupportedType,
        to: SupportedType,
    },

    /// Same family, but no conversion path exists.
    #[error("unsupported conversion from {from} to {to}")]
    Unsupported {
        from: SupportedType,
        to: SupportedType,
    },

    /// A text transform was asked to work on bytes that are not UTF-8.
    #[error("payload is not valid UTF-8 text: {0}")]
    InvalidText(String),

    /// Decoding or re-encoding an image failed.
    #[error("failed to transcode {from} to {to}: {reason}")]
    TranscodeFailed {
        from: SupportedType,
        to: SupportedType,
        reason: String,
    },
}

impl ConversionError {
    /// `true` when the request itself is disallowed, as opposed to a legal
    /// request whose payload could not be processed.
    pub fn is_disallowed(&self) -> bool {
        matches!(
            self,
            Self::UnknownExtension(_) | Self::CrossFamily { .. } | Self::Unsupported { .. }
        )
    }
}

/// Convenience alias for conversion results.
pub type ConvertResult<T> = Result<T, ConversionError>;
