use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use fragments_types::{FragmentId, FragmentKey, OwnerId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{DataStore, MetadataStore};

type OwnerMap<V> = HashMap<OwnerId, BTreeMap<FragmentId, V>>;

/// A two-level map (`owner` → `id` → value) behind a `RwLock`.
///
/// Locks are only held for the map operation itself, never across an
/// `.await`.
struct KeyedMap<V> {
    inner: RwLock<OwnerMap<V>>,
}

impl<V: Clone> KeyedMap<V> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, OwnerMap<V>>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, OwnerMap<V>>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn put(&self, key: &FragmentKey, value: V) -> StoreResult<()> {
        self.write()?
            .entry(key.owner.clone())
            .or_default()
            .insert(key.id.clone(), value);
        Ok(())
    }

    fn get(&self, key: &FragmentKey) -> StoreResult<Option<V>> {
        Ok(self
            .read()?
            .get(&key.owner)
            .and_then(|entries| entries.get(&key.id))
            .cloned())
    }

    fn entries(&self, owner: &OwnerId) -> StoreResult<Vec<(FragmentId, V)>> {
        Ok(self
            .read()?
            .get(owner)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, v)| (id.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn ids(&self, owner: &OwnerId) -> StoreResult<Vec<FragmentId>> {
        Ok(self
            .read()?
            .get(owner)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn remove(&self, key: &FragmentKey) -> StoreResult<bool> {
        let mut map = self.write()?;
        let Some(entries) = map.get_mut(&key.owner) else {
            return Ok(false);
        };
        let existed = entries.remove(&key.id).is_some();
        if entries.is_empty() {
            map.remove(&key.owner);
        }
        Ok(existed)
    }

    fn len(&self) -> usize {
        self.read()
            .map(|map| map.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }
}

/// In-memory metadata store.
///
/// Intended for tests and single-process development. Records are held as
/// the serialized JSON text, exactly as a remote store would hold them.
pub struct InMemoryMetadataStore {
    records: KeyedMap<String>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            records: KeyedMap::new(),
        }
    }

    /// Number of records across all owners.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMetadataStore")
            .field("record_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, key: &FragmentKey, serialized: String) -> StoreResult<()> {
        self.records.put(key, serialized)
    }

    async fn get(&self, key: &FragmentKey) -> StoreResult<Option<String>> {
        self.records.get(key)
    }

    async fn records(&self, owner: &OwnerId) -> StoreResult<Vec<(FragmentId, String)>> {
        self.records.entries(owner)
    }

    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool> {
        self.records.remove(key)
    }

    async fn keys(&self, owner: &OwnerId) -> StoreResult<Vec<FragmentId>> {
        self.records.ids(owner)
    }
}

/// In-memory payload store.
///
/// `Bytes` clones are reference-counted, so reads do not copy payloads.
pub struct InMemoryDataStore {
    payloads: KeyedMap<Bytes>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self {
            payloads: KeyedMap::new(),
        }
    }

    /// Number of payloads across all owners.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDataStore")
            .field("payload_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn put(&self, key: &FragmentKey, data: Bytes) -> StoreResult<()> {
        self.payloads.put(key, data)
    }

    async fn get(&self, key: &FragmentKey) -> StoreResult<Bytes> {
        self.payloads
            .get(key)?
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool> {
        self.payloads.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(owner: &str, id: &str) -> FragmentKey {
        FragmentKey::new(OwnerId::new(owner).unwrap(), FragmentId::new(id).unwrap())
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn metadata_put_get_roundtrip() {
        let store = InMemoryMetadataStore::new();
        let k = key("a", "1");
        store.put(&k, "{\"x\":1}".into()).await.unwrap();
        assert_eq!(store.get(&k).await.unwrap().as_deref(), Some("{\"x\":1}"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn metadata_missing_is_none() {
        let store = InMemoryMetadataStore::new();
        assert!(store.get(&key("a", "nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn metadata_put_replaces() {
        let store = InMemoryMetadataStore::new();
        let k = key("a", "1");
        store.put(&k, "old".into()).await.unwrap();
        store.put(&k, "new".into()).await.unwrap();
        assert_eq!(store.get(&k).await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner_and_sorted() {
        let store = InMemoryMetadataStore::new();
        store.put(&key("a", "2"), "a2".into()).await.unwrap();
        store.put(&key("a", "1"), "a1".into()).await.unwrap();
        store.put(&key("b", "3"), "b3".into()).await.unwrap();

        let owner = OwnerId::new("a").unwrap();
        let ids: Vec<String> = store
            .keys(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);

        let records = store.records(&owner).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, "a1");

        let nobody = OwnerId::new("c").unwrap();
        assert!(store.keys(&nobody).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_id_under_different_owners_is_distinct() {
        let store = InMemoryMetadataStore::new();
        store.put(&key("a", "1"), "mine".into()).await.unwrap();
        store.put(&key("b", "1"), "theirs".into()).await.unwrap();
        assert_eq!(store.get(&key("a", "1")).await.unwrap().as_deref(), Some("mine"));
        assert_eq!(store.get(&key("b", "1")).await.unwrap().as_deref(), Some("theirs"));
    }

    #[tokio::test]
    async fn metadata_delete_reports_existence() {
        let store = InMemoryMetadataStore::new();
        let k = key("a", "1");
        store.put(&k, "x".into()).await.unwrap();
        assert!(store.delete(&k).await.unwrap());
        assert!(!store.delete(&k).await.unwrap());
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Data
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn data_put_get_roundtrip() {
        let store = InMemoryDataStore::new();
        let k = key("a", "1");
        store.put(&k, Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(store.get(&k).await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn data_missing_is_not_found() {
        let store = InMemoryDataStore::new();
        let k = key("a", "1");
        assert!(matches!(store.get(&k).await, Err(StoreError::NotFound(missing)) if missing == k));
    }

    #[tokio::test]
    async fn data_delete() {
        let store = InMemoryDataStore::new();
        let k = key("a", "1");
        store.put(&k, Bytes::from_static(b"x")).await.unwrap();
        assert!(store.delete(&k).await.unwrap());
        assert!(!store.delete(&k).await.unwrap());
        assert!(store.get(&k).await.is_err());
    }
}
