use crate::batch::{CommitReceipt, WriteBatch};
use crate::error::StoreResult;
use crate::snapshot::Snapshot;
use crate::{DocumentStore, LinkFilter};
use folio_schema::{Index, Link, Version, VersionState};
use parking_lot::RwLock;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Store persisting the whole library to a single JSON file.
///
/// Every commit writes a complete new snapshot next to the target and renames
/// it into place, so readers of the file never observe a half-applied batch.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: RwLock<Snapshot>,
}

impl JsonFileStore {
    /// Open the library at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Snapshot::default()
        };

        Ok(Self {
            path,
            inner: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, snapshot)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Apply `change` to a copy of the snapshot and swap it in once on disk
    fn write_with<T>(&self, change: impl FnOnce(&mut Snapshot) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        let result = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(result)
    }
}

impl DocumentStore for JsonFileStore {
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
        self.write_with(|snapshot| snapshot.apply(batch))
    }

    fn delete_index(&self, title: &str) -> StoreResult<()> {
        self.write_with(|snapshot| snapshot.delete_index(title))
    }
}
