//! Whole-library state shared by the store backends.
//!
//! `apply` checks every document in a batch before writing any of them, which
//! is what makes a commit atomic.

use crate::batch::{CommitReceipt, WriteBatch};
use crate::error::{StoreError, StoreResult};
use crate::LinkFilter;
use folio_schema::{Index, Link, LinkId, RefPrefix, Version, VersionKey, VersionState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Snapshot {
    #[serde(default)]
    indexes: BTreeMap<String, Index>,
    #[serde(default)]
    versions: BTreeMap<String, Version>,
    #[serde(default)]
    links: BTreeMap<LinkId, Link>,
    #[serde(default)]
    states: BTreeMap<String, VersionState>,
    #[serde(default)]
    next_link_id: LinkId,
}

fn version_slot(key: &VersionKey) -> String {
    key.to_string()
}

impl Snapshot {
    pub(crate) fn load_index(&self, title: &str) -> StoreResult<Index> {
        self.indexes
            .get(title)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("index '{}'", title)))
    }

    pub(crate) fn indexes(&self) -> Vec<Index> {
        self.indexes.values().cloned().collect()
    }

    pub(crate) fn versions(&self, title: &str) -> Vec<Version> {
        self.versions
            .values()
            .filter(|v| v.title == title)
            .cloned()
            .collect()
    }

    pub(crate) fn links(&self, filter: &LinkFilter) -> Vec<Link> {
        self.links
            .values()
            .filter(|link| match filter {
                LinkFilter::All => true,
                LinkFilter::Under(prefix) => link.references(prefix),
            })
            .cloned()
            .collect()
    }

    pub(crate) fn version_state(&self, title: &str) -> Option<VersionState> {
        self.states.get(title).cloned()
    }

    pub(crate) fn apply(&mut self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        self.check_revisions(&batch)?;
        for index in &batch.indexes {
            index.schema.validate()?;
        }
        if !batch.options.override_dependencies {
            self.check_dependencies(&batch)?;
        }

        let mut receipt = CommitReceipt::default();

        for mut index in batch.indexes {
            index.revision += 1;
            self.indexes.insert(index.title.clone(), index);
            receipt.indexes += 1;
        }
        for mut version in batch.versions {
            version.revision += 1;
            self.versions.insert(version_slot(&version.key()), version);
            receipt.versions += 1;
        }
        for id in batch.deleted_links {
            self.links.remove(&id);
            receipt.links_deleted += 1;
        }
        for mut link in batch.links {
            let id = match link.id {
                Some(id) => id,
                None => {
                    self.next_link_id += 1;
                    self.next_link_id
                }
            };
            link.id = Some(id);
            link.revision += 1;
            self.links.insert(id, link);
            receipt.link_ids.push(id);
        }
        for mut state in batch.states {
            state.revision += 1;
            self.states.insert(state.title.clone(), state);
            receipt.states += 1;
        }

        Ok(receipt)
    }

    /// Optimistic concurrency: a saved document must carry the stored revision
    fn check_revisions(&self, batch: &WriteBatch) -> StoreResult<()> {
        let mut stale = Vec::new();

        for index in &batch.indexes {
            let stored = self.indexes.get(&index.title).map(|i| i.revision);
            if stored.is_some_and(|r| r != index.revision) {
                stale.push(format!("index '{}'", index.title));
            }
        }
        for version in &batch.versions {
            let key = version.key();
            let stored = self.versions.get(&version_slot(&key)).map(|v| v.revision);
            if stored.is_some_and(|r| r != version.revision) {
                stale.push(format!("version '{}'", key));
            }
        }
        for link in &batch.links {
            if let Some(id) = link.id {
                match self.links.get(&id) {
                    Some(stored) if stored.revision == link.revision => {}
                    _ => stale.push(format!("link {}", id)),
                }
            }
        }
        for id in &batch.deleted_links {
            if !self.links.contains_key(id) {
                stale.push(format!("link {}", id));
            }
        }
        for state in &batch.states {
            let stored = self.states.get(&state.title).map(|s| s.revision);
            if stored.is_some_and(|r| r != state.revision) {
                stale.push(format!("version state '{}'", state.title));
            }
        }

        if stale.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Conflict { documents: stale })
        }
    }

    /// Every saved version must fit its schema, and every saved schema must
    /// fit the versions left untouched
    fn check_dependencies(&self, batch: &WriteBatch) -> StoreResult<()> {
        for version in &batch.versions {
            let index = self.governing_index(batch, &version.title).ok_or_else(|| {
                StoreError::DependencyCheck(format!("no index for version '{}'", version.key()))
            })?;
            if !version.chapter.conforms_to(index.schema.root()) {
                return Err(StoreError::DependencyCheck(format!(
                    "version '{}' does not match the schema of '{}'",
                    version.key(),
                    index.title
                )));
            }
        }

        let saved: BTreeSet<VersionKey> = batch.versions.iter().map(Version::key).collect();
        for index in &batch.indexes {
            let untouched = self
                .versions
                .values()
                .filter(|v| v.title == index.title && !saved.contains(&v.key()));
            for version in untouched {
                if !version.chapter.conforms_to(index.schema.root()) {
                    return Err(StoreError::DependencyCheck(format!(
                        "schema of '{}' no longer matches version '{}'",
                        index.title,
                        version.key()
                    )));
                }
            }
        }
        Ok(())
    }

    fn governing_index<'a>(&'a self, batch: &'a WriteBatch, title: &str) -> Option<&'a Index> {
        batch
            .indexes
            .iter()
            .find(|i| i.title == title)
            .or_else(|| self.indexes.get(title))
    }

    /// Remove an index with its versions, state and every link into the book
    pub(crate) fn delete_index(&mut self, title: &str) -> StoreResult<()> {
        if self.indexes.remove(title).is_none() {
            return Err(StoreError::NotFound(format!("index '{}'", title)));
        }
        self.versions.retain(|_, v| v.title != title);
        self.states.remove(title);
        let prefix = RefPrefix::container(title);
        self.links.retain(|_, link| !link.references(&prefix));
        Ok(())
    }
}
