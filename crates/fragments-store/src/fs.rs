//! Filesystem-backed stores.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<hex(owner)>/<hex(id)>.<ext>
//! ```
//!
//! Owner and id are hex-encoded so that no key, whatever it contains
//! (`/`, `..`, NUL), can name a path outside the root. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! observes a half-written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use fragments_types::{FragmentId, FragmentKey, OwnerId};
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::traits::{DataStore, MetadataStore};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Maps keys to paths under a root with a fixed file extension.
#[derive(Clone, Debug)]
struct KeyLayout {
    root: PathBuf,
    ext: &'static str,
}

impl KeyLayout {
    fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.root.join(hex::encode(owner.as_str()))
    }

    fn path(&self, key: &FragmentKey) -> PathBuf {
        self.owner_dir(&key.owner)
            .join(format!("{}.{}", hex::encode(key.id.as_str()), self.ext))
    }

    /// Decode a directory entry name back into an id.
    ///
    /// Returns `None` for names this layout did not produce (temp files,
    /// foreign files).
    fn decode_name(&self, name: &str) -> Option<FragmentId> {
        let stem = name.strip_suffix(self.ext)?.strip_suffix('.')?;
        let raw = hex::decode(stem).ok()?;
        let id = String::from_utf8(raw).ok()?;
        FragmentId::new(id).ok()
    }

    async fn write_atomic(&self, key: &FragmentKey, contents: &[u8]) -> StoreResult<()> {
        let path = self.path(key);
        let dir = self.owner_dir(&key.owner);
        fs::create_dir_all(&dir).await?;
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!(".tmp-{}-{n}", std::process::id()));
        let written = match fs::write(&tmp, contents).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read(&self, key: &FragmentKey) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &FragmentKey) -> StoreResult<bool> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn ids(&self, owner: &OwnerId) -> StoreResult<Vec<(FragmentId, PathBuf)>> {
        let dir = self.owner_dir(owner);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match self.decode_name(name) {
                Some(id) => ids.push((id, entry.path())),
                None if name.starts_with(".tmp-") => {}
                None => tracing::warn!(dir = %dir.display(), name, "ignoring unrecognised file"),
            }
        }
        ids.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(ids)
    }
}

/// Metadata store keeping one JSON file per fragment.
#[derive(Clone, Debug)]
pub struct FsMetadataStore {
    layout: KeyLayout,
}

impl FsMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: KeyLayout {
                root: root.into(),
                ext: "json",
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

fn utf8(key: &FragmentKey, raw: Vec<u8>) -> StoreResult<String> {
    String::from_utf8(raw).map_err(|e| StoreError::Corrupt {
        key: key.clone(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl MetadataStore for FsMetadataStore {
    async fn put(&self, key: &FragmentKey, serialized: String) -> StoreResult<()> {
        self.layout.write_atomic(key, serialized.as_bytes()).await
    }

    async fn get(&self, key: &FragmentKey) -> StoreResult<Option<String>> {
        match self.layout.read(key).await? {
            Some(raw) => utf8(key, raw).map(Some),
            None => Ok(None),
        }
    }

    async fn records(&self, owner: &OwnerId) -> StoreResult<Vec<(FragmentId, String)>> {
        let mut records = Vec::new();
        for (id, path) in self.layout.ids(owner).await? {
            // A file removed between listing and reading is simply gone.
            let raw = match fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let text = utf8(&FragmentKey::new(owner.clone(), id.clone()), raw)?;
            records.push((id, text));
        }
        Ok(records)
    }

    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool> {
        self.layout.remove(key).await
    }

    async fn keys(&self, owner: &OwnerId) -> StoreResult<Vec<FragmentId>> {
        Ok(self
            .layout
            .ids(owner)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }
}

/// Payload store keeping one file per fragment.
///
/// Stands in for an object-storage bucket: the key shape is the same
/// `owner/id` pair an object store would use.
#[derive(Clone, Debug)]
pub struct FsDataStore {
    layout: KeyLayout,
}

impl FsDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: KeyLayout {
                root: root.into(),
                ext: "bin",
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

#[async_trait]
impl DataStore for FsDataStore {
    async fn put(&self, key: &FragmentKey, data: Bytes) -> StoreResult<()> {
        self.layout.write_atomic(key, &data).await
    }

    async fn get(&self, key: &FragmentKey) -> StoreResult<Bytes> {
        self.layout
            .read(key)
            .await?
            .map(Bytes::from)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn delete(&self, key: &FragmentKey) -> StoreResult<bool> {
        self.layout.remove(key).await
    }
}
