use crate::batch::{CommitReceipt, WriteBatch};
use crate::error::StoreResult;
use crate::snapshot::Snapshot;
use crate::{DocumentStore, LinkFilter};
use folio_schema::{Index, Link, Version, VersionState};
use parking_lot::RwLock;

/// In-memory store (for tests, temp libraries)
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn load_index(&self, title: &str) -> StoreResult<Index> {
        self.inner.read().load_index(title)
    }

    fn indexes(&self) -> StoreResult<Vec<Index>> {
        Ok(self.inner.read().indexes())
    }

    fn versions(&self, title: &str) -> StoreResult<Vec<Version>> {
        Ok(self.inner.read().versions(title))
    }

    fn links(&self, filter: &LinkFilter) -> StoreResult<Vec<Link>> {
        Ok(self.inner.read().links(filter))
    }

    fn version_state(&self, title: &str) -> StoreResult<Option<VersionState>> {
        Ok(self.inner.read().version_state(title))
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        self.inner.write().apply(batch)
    }

    fn delete_index(&self, title: &str) -> StoreResult<()> {
        self.inner.write().delete_index(title)
    }
}
