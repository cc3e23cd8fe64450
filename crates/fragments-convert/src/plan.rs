//! The negotiation decision table.
//!
//! [`plan`] maps `(stored type, requested extension)` to a [`Conversion`]
//! without looking at the payload; [`Conversion::apply`] then performs it.
//! Rules are evaluated in order and the first match wins:
//!
//! 1. unknown extension: `UnknownExtension`
//! 2. target is the stored base type: `Identity`
//! 3. Markdown to HTML: `RenderMarkdown`
//! 4. image to image: `Transcode`
//! 5. image to non-image or the reverse: `CrossFamily`
//! 6. target listed in the stored type's formats: `Retype`
//! 7. anything else: `Unsupported`

use bytes::Bytes;
use fragments_types::{Family, MediaType, SupportedType};

use crate::error::{ConversionError, ConvertResult};
use crate::markdown::render_markdown;
use crate::raster;

/// A legal conversion, decided but not yet applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Return the payload as stored, under the stored type (parameters kept).
    Identity(MediaType),
    /// Same bytes, different `Content-Type`.
    Retype(SupportedType),
    /// Render Markdown source to HTML.
    RenderMarkdown,
    /// Re-encode one image format as another.
    Transcode {
        from: SupportedType,
        to: SupportedType,
    },
}

/// The output of an applied conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converted {
    pub body: Bytes,
    pub content_type: String,
}

impl Conversion {
    /// The `Content-Type` the converted body will carry.
    pub fn content_type(&self) -> String {
        match self {
            Self::Identity(media) => media.as_str().to_string(),
            Self::Retype(to) => to.essence().to_string(),
            Self::RenderMarkdown => SupportedType::TextHtml.essence().to_string(),
            Self::Transcode { to, .. } => to.essence().to_string(),
        }
    }

    /// `true` for conversions that do real work on the payload.
    pub fn is_cpu_bound(&self) -> bool {
        matches!(self, Self::RenderMarkdown | Self::Transcode { .. })
    }

    /// Apply the conversion to `payload`.
    pub fn apply(self, payload: Bytes) -> ConvertResult<Converted> {
        let content_type = self.content_type();
        let body = match self {
            Self::Identity(_) | Self::Retype(_) => payload,
            Self::RenderMarkdown => {
                let source = std::str::from_utf8(&payload)
                    .map_err(|e| ConversionError::InvalidText(e.to_string()))?;
                Bytes::from(render_markdown(source))
            }
            Self::Transcode { from, to } => raster::transcode(&payload, from, to)?,
        };
        Ok(Converted { body, content_type })
    }
}

/// Decide how a fragment of type `stored` can be served as `extension`.
pub fn plan(stored: &MediaType, extension: &str) -> ConvertResult<Conversion> {
    let from = stored.base();
    let to = SupportedType::from_extension(extension)
        .ok_or_else(|| ConversionError::UnknownExtension(extension.to_string()))?;

    let decision = if to == from {
        Conversion::Identity(stored.clone())
    } else if from == SupportedType::TextMarkdown && to == SupportedType::TextHtml {
        Conversion::RenderMarkdown
    } else {
        match (from.family(), to.family()) {
            (Family::Image, Family::Image) => Conversion::Transcode { from, to },
            (Family::Image, _) | (_, Family::Image) => {
                return Err(ConversionError::CrossFamily { from, to })
            }
            _ if from.formats().contains(&to) => Conversion::Retype(to),
            _ => return Err(ConversionError::Unsupported { from, to }),
        }
    };

    tracing::debug!(%from, %to, ?decision, "planned conversion");
    Ok(decision)
}

/// Plan and apply in one step.
pub fn negotiate(stored: &MediaType, extension: &str, payload: Bytes) -> ConvertResult<Converted> {
    plan(stored, extension)?.apply(payload)
}
