use async_trait::async_trait;
use bytes::Bytes;
use fragments_types::{FragmentId, FragmentKey, OwnerId};

use crate::error::StoreResult;

/// Store for serialized fragment metadata.
///
/// Implementations must be thread-safe and treat the serialized text as
/// opaque. Writes replace any existing record for the key.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write (create or replace) the record at `key`.
    async fn put(&self, key: &FragmentKey, serialized: String) -> StoreResult<()>;

    /// Read the record at `key`.
    ///
    /// Returns `Ok(None)` if no record exists.
    /// Returns `Err` on backend failure.
    async fn get(&self, key: &FragmentKey) -> StoreResult<Option<String>>;

    /// All records owned by `owner`, sorted by id.
    async fn records(&self, owner: &OwnerId) -> StoreResult<Vec<(FragmentId, String)>>;

    /// Delete the record at `key`. Returns `true` if it existed.
    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool>;

    /// Ids of all records owned by `owner`, sorted.
    ///
    /// Default implementation projects [`records`](Self::records). Backends
    /// that can list keys without reading values should override it.
    async fn keys(&self, owner: &OwnerId) -> StoreResult<Vec<FragmentId>> {
        Ok(self
            .records(owner)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }
}

/// Store for raw fragment payloads.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Write (create or replace) the payload at `key`.
    async fn put(&self, key: &FragmentKey, data: Bytes) -> StoreResult<()>;

    /// Read the payload at `key`.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if absent.
    async fn get(&self, key: &FragmentKey) -> StoreResult<Bytes>;

    /// Delete the payload at `key`. Returns `true` if it existed.
    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool>;
}
