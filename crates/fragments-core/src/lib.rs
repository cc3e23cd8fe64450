//! The fragment entity.
//!
//! A [`Fragment`] couples validated metadata (owner, media type, size,
//! timestamps) to a payload held in a separate store. This crate owns the
//! rules that keep the two consistent: validation before any I/O, and a
//! fixed write order (payload first, metadata second) across stores that are
//! not transactional.
//!
//! Every persistence operation takes the [`Storage`] bundle explicitly.
//!
//! [`Storage`]: fragments_store::Storage

pub mod error;
pub mod fragment;
pub mod persist;

pub use error::{FragmentError, FragmentResult, ValidationError};
pub use fragment::{Fragment, FragmentFields};
pub use persist::FragmentListing;

// Re-export key types
pub use fragments_store::Storage;
pub use fragments_types::{is_supported_type, FragmentId, FragmentKey, MediaType, OwnerId, SupportedType};
