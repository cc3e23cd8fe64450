//! Storage backends for the fragments store.
//!
//! A fragment is persisted in two independent places: a metadata store
//! (key `(owner, id)` → JSON text) and a data store (key `(owner, id)` → raw
//! bytes). This crate defines both ports and ships two backends for each.
//!
//! # Storage Backends
//!
//! - [`InMemoryMetadataStore`] / [`InMemoryDataStore`] -- `HashMap`-based, for tests and dev
//! - [`FsMetadataStore`] / [`FsDataStore`] -- durable, one directory per owner
//!
//! [`Storage`] bundles one of each behind `Arc<dyn ...>` so callers can swap
//! backends without changing behaviour.
//!
//! # Design Rules
//!
//! 1. Every operation is addressed by the full [`FragmentKey`]; never by id alone.
//! 2. The stores never interpret what they hold.
//! 3. A missing metadata record is `Ok(None)`; a missing payload is [`StoreError::NotFound`].
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`FragmentKey`]: fragments_types::FragmentKey

pub mod error;
pub mod fs;
pub mod memory;
pub mod storage;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::{FsDataStore, FsMetadataStore};
pub use memory::{InMemoryDataStore, InMemoryMetadataStore};
pub use storage::Storage;
pub use traits::{DataStore, MetadataStore};
