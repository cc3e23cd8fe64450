//! Content negotiation for the fragments store.
//!
//! Given a stored media type and a requested extension, decides whether the
//! conversion is legal and, if so, performs it. Nothing here touches storage:
//! the decision is a total function over `(stored type, extension)` and the
//! transforms are pure byte-to-byte functions.
//!
//! # Key Types
//!
//! - [`Conversion`] -- The decision: identity, re-type, Markdown render, or image transcode
//! - [`Converted`] -- Output body plus its `Content-Type`
//! - [`ConversionError`] -- Why a conversion was refused or failed
//!
//! # Entry Points
//!
//! - [`plan`] -- decide only (no payload needed)
//! - [`negotiate`] -- decide and apply

pub mod error;
pub mod markdown;
pub mod plan;
pub mod raster;

pub use error::{ConversionError, ConvertResult};
pub use markdown::render_markdown;
pub use plan::{negotiate, plan, Conversion, Converted};
