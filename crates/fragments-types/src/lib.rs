//! Foundation types for the fragments store.
//!
//! This crate provides the identity and media-type vocabulary shared by every
//! other fragments crate. Nothing here performs I/O.
//!
//! # Key Types
//!
//! - [`OwnerId`] -- Opaque, non-empty identifier of the principal owning a fragment
//! - [`FragmentId`] -- Opaque, non-empty fragment identifier (UUID v4 when generated)
//! - [`FragmentKey`] -- The `(owner, id)` pair addressing both metadata and data
//! - [`MediaType`] -- A validated `Content-Type` value whose base type is supported
//! - [`SupportedType`] -- The closed set of base types, with formats and extensions

pub mod error;
pub mod ids;
pub mod media;

pub use error::TypeError;
pub use ids::{FragmentId, FragmentKey, OwnerId, MAX_ID_LEN};
pub use media::{is_supported_type, Family, MediaType, SupportedType};
