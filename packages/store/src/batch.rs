use folio_schema::{Index, Link, LinkId, Version, VersionState};

/// Save semantics for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Skip checks that assume version content matches an unchanged schema
    pub override_dependencies: bool,
}

/// Group of writes committed atomically: either every document is saved or none
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub options: SaveOptions,
    pub indexes: Vec<Index>,
    pub versions: Vec<Version>,
    pub links: Vec<Link>,
    pub deleted_links: Vec<LinkId>,
    pub states: Vec<VersionState>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_dependencies(mut self) -> Self {
        self.options.override_dependencies = true;
        self
    }

    pub fn save_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn save_version(mut self, version: Version) -> Self {
        self.versions.push(version);
        self
    }

    pub fn save_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn delete_link(mut self, id: LinkId) -> Self {
        self.deleted_links.push(id);
        self
    }

    pub fn save_state(mut self, state: VersionState) -> Self {
        self.states.push(state);
        self
    }
}

/// Outcome of a committed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub indexes: usize,
    pub versions: usize,
    /// Ids of saved links, in batch order (new links get fresh ids)
    pub link_ids: Vec<LinkId>,
    pub links_deleted: usize,
    pub states: usize,
}
