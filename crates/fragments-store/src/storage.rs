use std::path::Path;
use std::sync::Arc;

use crate::fs::{FsDataStore, FsMetadataStore};
use crate::memory::{InMemoryDataStore, InMemoryMetadataStore};
use crate::traits::{DataStore, MetadataStore};

/// The pair of stores backing fragments.
///
/// Constructed once by the service bootstrap and shared by reference (it is
/// cheap to clone). The two stores are independent and not transactional;
/// callers own the write ordering between them.
#[derive(Clone)]
pub struct Storage {
    metadata: Arc<dyn MetadataStore>,
    data: Arc<dyn DataStore>,
}

impl Storage {
    pub fn new(metadata: Arc<dyn MetadataStore>, data: Arc<dyn DataStore>) -> Self {
        Self { metadata, data }
    }

    /// Both stores in memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryDataStore::new()),
        )
    }

    /// Both stores on disk under `root` (`root/metadata`, `root/data`).
    pub fn filesystem(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            Arc::new(FsMetadataStore::new(root.join("metadata"))),
            Arc::new(FsDataStore::new(root.join("data"))),
        )
    }

    pub fn metadata(&self) -> &dyn MetadataStore {
        self.metadata.as_ref()
    }

    pub fn data(&self) -> &dyn DataStore {
        self.data.as_ref()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
