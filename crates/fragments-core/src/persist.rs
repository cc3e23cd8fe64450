//! Persistence of fragments across the metadata and data stores.
//!
//! The stores are independent and not transactional. Writes follow one
//! order: the payload goes to the data store first, and metadata is only
//! re-persisted once that write has succeeded. Metadata therefore never
//! describes a payload that was not fully written, at the cost of possible
//! orphaned payloads when the metadata write fails.

use bytes::Bytes;
use chrono::Utc;
use fragments_store::{StoreError, Storage};
use fragments_types::{FragmentId, FragmentKey, OwnerId};
use serde::Serialize;

use crate::error::{FragmentError, FragmentResult};
use crate::fragment::Fragment;

/// The result of listing an owner's fragments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FragmentListing {
    /// Ids only, sorted.
    Ids(Vec<FragmentId>),
    /// Full metadata, sorted by id.
    Full(Vec<Fragment>),
}

impl FragmentListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Full(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn corrupt(key: &FragmentKey, reason: String) -> FragmentError {
    tracing::error!(%key, %reason, "corrupt metadata record");
    FragmentError::CorruptRecord {
        key: key.clone(),
        reason,
    }
}

fn decode(key: &FragmentKey, text: &str) -> FragmentResult<Fragment> {
    let fragment: Fragment = serde_json::from_str(text).map_err(|e| corrupt(key, e.to_string()))?;
    if fragment.key() != *key {
        return Err(corrupt(key, format!("record describes {}", fragment.key())));
    }
    Ok(fragment)
}

/// Records the backend could not even hand over as text are corrupt too.
fn read_failure(err: StoreError) -> FragmentError {
    match err {
        StoreError::Corrupt { key, reason } => corrupt(&key, reason),
        other => other.into(),
    }
}

impl Fragment {
    /// Persist metadata, stamping `updated` with the current time.
    pub async fn save(&mut self, storage: &Storage) -> FragmentResult<()> {
        self.updated = Utc::now();
        let serialized =
            serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let key = self.key();
        storage.metadata().put(&key, serialized).await?;
        tracing::debug!(%key, size = self.size, "saved fragment metadata");
        Ok(())
    }

    /// Replace the payload, then update `size` and re-persist metadata.
    ///
    /// If the payload write fails, neither this value nor the stored
    /// metadata is changed.
    pub async fn set_data(&mut self, storage: &Storage, data: Bytes) -> FragmentResult<()> {
        let key = self.key();
        let size = data.len() as u64;
        storage.data().put(&key, data).await?;
        self.size = size;
        self.save(storage).await
    }

    /// Read the payload.
    ///
    /// A missing payload is [`StoreError::NotFound`], distinct from missing
    /// metadata.
    pub async fn get_data(&self, storage: &Storage) -> FragmentResult<Bytes> {
        Ok(storage.data().get(&self.key()).await?)
    }

    /// Look up one fragment's metadata. `Ok(None)` if there is no record.
    pub async fn by_id(
        storage: &Storage,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> FragmentResult<Option<Fragment>> {
        let key = FragmentKey::new(owner.clone(), id.clone());
        match storage.metadata().get(&key).await.map_err(read_failure)? {
            Some(text) => decode(&key, &text).map(Some),
            None => Ok(None),
        }
    }

    /// List `owner`'s fragments.
    ///
    /// With `expand`, every record is decoded; a single corrupt record fails
    /// the whole call.
    pub async fn by_user(
        storage: &Storage,
        owner: &OwnerId,
        expand: bool,
    ) -> FragmentResult<FragmentListing> {
        if !expand {
            return Ok(FragmentListing::Ids(storage.metadata().keys(owner).await?));
        }
        let records = storage.metadata().records(owner).await.map_err(read_failure)?;
        let fragments = records
            .into_iter()
            .map(|(id, text)| decode(&FragmentKey::new(owner.clone(), id), &text))
            .collect::<FragmentResult<Vec<_>>>()?;
        Ok(FragmentListing::Full(fragments))
    }

    /// Delete the payload, then the metadata.
    ///
    /// Both deletes are always attempted. Returns `false` only when neither
    /// store held anything for the key.
    pub async fn delete(storage: &Storage, owner: &OwnerId, id: &FragmentId) -> FragmentResult<bool> {
        let key = FragmentKey::new(owner.clone(), id.clone());
        let data = storage.data().delete(&key).await;
        let metadata = storage.metadata().delete(&key).await;

        match (data, metadata) {
            (Ok(data_existed), Ok(metadata_existed)) => {
                if data_existed != metadata_existed {
                    tracing::warn!(%key, data_existed, metadata_existed, "deleted half of a fragment");
                }
                tracing::debug!(%key, "deleted fragment");
                Ok(metadata_existed || data_existed)
            }
            (data, metadata) => {
                let data = data.err().map(|e| e.to_string());
                let metadata = metadata.err().map(|e| e.to_string());
                tracing::warn!(%key, ?data, ?metadata, "fragment delete incomplete");
                Err(FragmentError::DeleteIncomplete { key, data, metadata })
            }
        }
    }
}
