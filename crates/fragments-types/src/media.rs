//! Supported media types, their conversion formats, and the extension table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The closed set of base media types the store accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupportedType {
    TextPlain,
    TextMarkdown,
    TextHtml,
    TextCsv,
    ApplicationJson,
    ApplicationYaml,
    ImagePng,
    ImageJpeg,
    ImageWebp,
}

/// Coarse grouping used by content negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    /// `text/*`
    Text,
    /// Structured data (`application/*`).
    Data,
    /// `image/*`
    Image,
}

impl SupportedType {
    pub const ALL: [SupportedType; 9] = [
        Self::TextPlain,
        Self::TextMarkdown,
        Self::TextHtml,
        Self::TextCsv,
        Self::ApplicationJson,
        Self::ApplicationYaml,
        Self::ImagePng,
        Self::ImageJpeg,
        Self::ImageWebp,
    ];

    /// The `type/subtype` string.
    pub fn essence(&self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::TextMarkdown => "text/markdown",
            Self::TextHtml => "text/html",
            Self::TextCsv => "text/csv",
            Self::ApplicationJson => "application/json",
            Self::ApplicationYaml => "application/yaml",
            Self::ImagePng => "image/png",
            Self::ImageJpeg => "image/jpeg",
            Self::ImageWebp => "image/webp",
        }
    }

    /// Look up a base type. Matching is case-insensitive; parameters must
    /// already be stripped.
    pub fn from_essence(essence: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.essence().eq_ignore_ascii_case(essence))
    }

    /// Canonical file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TextPlain => "txt",
            Self::TextMarkdown => "md",
            Self::TextHtml => "html",
            Self::TextCsv => "csv",
            Self::ApplicationJson => "json",
            Self::ApplicationYaml => "yaml",
            Self::ImagePng => "png",
            Self::ImageJpeg => "jpg",
            Self::ImageWebp => "webp",
        }
    }

    /// Resolve an extension (with or without a leading dot) to its type.
    ///
    /// Accepts the aliases `yml` and `jpeg`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "yml" => Some(Self::ApplicationYaml),
            "jpeg" => Some(Self::ImageJpeg),
            other => Self::ALL.into_iter().find(|t| t.extension() == other),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Self::TextPlain | Self::TextMarkdown | Self::TextHtml | Self::TextCsv => Family::Text,
            Self::ApplicationJson | Self::ApplicationYaml => Family::Data,
            Self::ImagePng | Self::ImageJpeg | Self::ImageWebp => Family::Image,
        }
    }

    pub fn is_text(&self) -> bool {
        self.family() == Family::Text
    }

    pub fn is_image(&self) -> bool {
        self.family() == Family::Image
    }

    /// Types this one can legally be converted to, identity first.
    ///
    /// Images list only themselves: image-to-image transcoding is handled by
    /// a separate pipeline in the conversion crate.
    pub fn formats(&self) -> &'static [SupportedType] {
        match self {
            Self::TextPlain => &[Self::TextPlain],
            Self::TextMarkdown => &[Self::TextMarkdown, Self::TextHtml, Self::TextPlain],
            Self::TextHtml => &[Self::TextHtml, Self::TextPlain],
            Self::ApplicationJson => &[Self::ApplicationJson, Self::TextPlain],
            Self::TextCsv => &[Self::TextCsv],
            Self::ApplicationYaml => &[Self::ApplicationYaml],
            Self::ImagePng => &[Self::ImagePng],
            Self::ImageJpeg => &[Self::ImageJpeg],
            Self::ImageWebp => &[Self::ImageWebp],
        }
    }
}

impl fmt::Display for SupportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.essence())
    }
}

/// A validated `Content-Type` value.
///
/// Keeps the value as supplied (parameters such as `charset` included) so it
/// can be echoed back verbatim, alongside the resolved base type.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType {
    value: String,
    base: SupportedType,
}

impl MediaType {
    /// Parse a `Content-Type` value and check its base type is supported.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let value = value.trim();
        let parsed: mime::Mime = value.parse().map_err(|e: mime::FromStrError| {
            TypeError::InvalidMediaType {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;
        let essence = parsed.essence_str().to_ascii_lowercase();
        let base = SupportedType::from_essence(&essence)
            .ok_or_else(|| TypeError::UnsupportedMediaType(essence.clone()))?;
        Ok(Self {
            value: value.to_string(),
            base,
        })
    }

    /// The full value, parameters included.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The base `type/subtype` with parameters stripped.
    pub fn essence(&self) -> &'static str {
        self.base.essence()
    }

    pub fn base(&self) -> SupportedType {
        self.base
    }
}

impl From<SupportedType> for MediaType {
    fn from(base: SupportedType) -> Self {
        Self {
            value: base.essence().to_string(),
            base,
        }
    }
}

impl FromStr for MediaType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MediaType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaType> for String {
    fn from(media: MediaType) -> Self {
        media.value
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaType({})", self.value)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Returns `true` if `value` parses as a media type whose base type is in
/// the supported set. Malformed input is simply unsupported.
pub fn is_supported_type(value: &str) -> bool {
    MediaType::parse(value).is_ok()
}
