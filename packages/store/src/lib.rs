//! # Folio Store
//!
//! Persistence collaborators of the schema editor:
//!
//! - [`DocumentStore`]: load/save/delete of indexes, versions, links and
//!   version state, with atomic [`WriteBatch`] commits
//! - [`CatalogIndex`]: the library-wide title cache and commentary lookup,
//!   rebuilt after every structural commit
//!
//! Two store backends are provided: [`MemoryStore`] for tests and embedding,
//! and [`JsonFileStore`] which persists the whole library as one JSON file.

mod batch;
mod catalog;
mod error;
mod file;
mod memory;
mod snapshot;

pub use batch::{CommitReceipt, SaveOptions, WriteBatch};
pub use catalog::{CatalogIndex, Library};
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use folio_schema::{Index, Link, RefPrefix, Version, VersionState};

/// Selects links by their references
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFilter {
    All,
    /// Links with at least one reference under the prefix
    Under(RefPrefix),
}

/// Document persistence used by the editor
pub trait DocumentStore: Send + Sync {
    fn load_index(&self, title: &str) -> StoreResult<Index>;

    /// Every stored index
    fn indexes(&self) -> StoreResult<Vec<Index>>;

    /// Every version of the book titled `title`
    fn versions(&self, title: &str) -> StoreResult<Vec<Version>>;

    fn links(&self, filter: &LinkFilter) -> StoreResult<Vec<Link>>;

    fn version_state(&self, title: &str) -> StoreResult<Option<VersionState>>;

    /// Save and delete a group of documents atomically
    fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt>;

    /// Delete an index, cascading to its versions, version state and links
    fn delete_index(&self, title: &str) -> StoreResult<()>;
}
