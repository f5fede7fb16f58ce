//! # Version Repair
//!
//! Keeps stored content in step with a structural edit. Every version of the
//! edited book and every version of its commentaries gets the same
//! [`RepairEdit`]s.
//!
//! Repair is the read-only first phase of a mutation. Edits are applied to
//! copies of the stored versions, and the first addressing mismatch aborts
//! the whole plan. The caller commits the repaired copies together with the
//! schema change in one batch.
//!
//! Each edit re-checks the content before writing. A version that already has
//! the target shape (for example after an interrupted run) is reported as
//! skipped rather than failed, so re-applying an edit is safe.

use crate::addressor::ContentAddressor;
use crate::errors::{EditorError, EditorResult};
use folio_schema::{Chapter, NodePath, SchemaNode, Version, VersionKey, DEFAULT_KEY};
use folio_store::{CatalogIndex, DocumentStore};

/// Content-level counterpart of a schema edit
#[derive(Debug, Clone, PartialEq)]
pub enum RepairEdit {
    /// Add an empty skeleton for `node` at `path`
    InsertSkeleton { path: NodePath, node: SchemaNode },

    /// Drop the content at `path`. The text under it is lost.
    RemoveSubtree { path: NodePath },

    /// Move content unchanged from one slot to another
    Relocate { from: NodePath, to: NodePath },

    /// Replace a `{"default": X}` mapping at `path` with `X`
    CollapseDefault { path: NodePath },

    /// Replace the content at `path` with `{"default": content}`
    WrapAsDefault { path: NodePath },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Applied,
    /// Content already had the target shape
    AlreadyApplied,
}

impl RepairEdit {
    pub fn insert_skeleton(path: NodePath, node: SchemaNode) -> Self {
        RepairEdit::InsertSkeleton { path, node }
    }

    pub fn remove_subtree(path: NodePath) -> Self {
        RepairEdit::RemoveSubtree { path }
    }

    pub fn relocate(from: NodePath, to: NodePath) -> Self {
        RepairEdit::Relocate { from, to }
    }

    pub fn collapse_default(path: NodePath) -> Self {
        RepairEdit::CollapseDefault { path }
    }

    pub fn wrap_as_default(path: NodePath) -> Self {
        RepairEdit::WrapAsDefault { path }
    }

    /// Apply to one version. Commentary versions get skeletons with the extra
    /// comment level.
    pub fn apply(&self, version: &mut Version, commentary: bool) -> EditorResult<RepairOutcome> {
        let label = version.key().to_string();
        match self {
            RepairEdit::InsertSkeleton { path, node } => {
                let mut slice = ContentAddressor::locate(version, path)?;
                if slice.is_present() {
                    return Ok(RepairOutcome::AlreadyApplied);
                }
                let skeleton = if commentary {
                    Chapter::skeleton(&node.for_commentary())
                } else {
                    Chapter::skeleton(node)
                };
                slice.set(skeleton);
                Ok(RepairOutcome::Applied)
            }

            RepairEdit::RemoveSubtree { path } => {
                let mut slice = ContentAddressor::locate(version, path)?;
                match slice.delete() {
                    Some(_) => Ok(RepairOutcome::Applied),
                    None => Ok(RepairOutcome::AlreadyApplied),
                }
            }

            RepairEdit::Relocate { from, to } => {
                let source_present = ContentAddressor::get(version, from)?.is_some();
                let target_present = ContentAddressor::get(version, to)?.is_some();
                match (source_present, target_present) {
                    (false, true) => return Ok(RepairOutcome::AlreadyApplied),
                    (false, false) => {
                        return Err(EditorError::mismatch(label, from, "no content to relocate"))
                    }
                    (true, true) => {
                        return Err(EditorError::mismatch(label, to, "target slot is occupied"))
                    }
                    (true, false) => {}
                }

                let content = ContentAddressor::locate(version, from)?
                    .delete()
                    .ok_or_else(|| EditorError::mismatch(&label, from, "no content to relocate"))?;
                ContentAddressor::locate(version, to)?.set(content);
                Ok(RepairOutcome::Applied)
            }

            RepairEdit::CollapseDefault { path } => {
                let mut slice = ContentAddressor::locate(version, path)?;
                let collapsed = match slice.get() {
                    None => return Err(EditorError::mismatch(label, path, "no content to collapse")),
                    Some(Chapter::Branch(map)) if map.is_empty() => Chapter::default(),
                    Some(content @ Chapter::Branch(_)) => match content.default_only() {
                        Some(inner) => inner.clone(),
                        None => {
                            return Err(EditorError::mismatch(
                                label,
                                path,
                                format!("expected a single '{}' entry", DEFAULT_KEY),
                            ))
                        }
                    },
                    Some(_) => return Ok(RepairOutcome::AlreadyApplied),
                };
                slice.set(collapsed);
                Ok(RepairOutcome::Applied)
            }

            RepairEdit::WrapAsDefault { path } => {
                let mut slice = ContentAddressor::locate(version, path)?;
                match slice.delete() {
                    // leaf content is never a mapping, so a mapping means the wrap already happened
                    Some(content @ Chapter::Branch(_)) => {
                        slice.set(content);
                        Ok(RepairOutcome::AlreadyApplied)
                    }
                    Some(content) => {
                        slice.set(Chapter::wrap_default(content));
                        Ok(RepairOutcome::Applied)
                    }
                    None => Err(EditorError::mismatch(label, path, "no content to wrap")),
                }
            }
        }
    }
}

/// A version after repair, ready to be saved
#[derive(Debug, Clone)]
pub struct RepairedVersion {
    pub version: Version,
    pub applied: usize,
}

impl RepairedVersion {
    /// Nothing left to write for this version
    pub fn is_unchanged(&self) -> bool {
        self.applied == 0
    }
}

/// Outcome of the read-only repair phase
#[derive(Debug, Clone, Default)]
pub struct RepairPlan {
    pub versions: Vec<RepairedVersion>,
}

impl RepairPlan {
    /// Versions that need saving
    pub fn changed(&self) -> impl Iterator<Item = &Version> {
        self.versions
            .iter()
            .filter(|r| !r.is_unchanged())
            .map(|r| &r.version)
    }

    /// Versions that were already in the target shape
    pub fn skipped(&self) -> Vec<VersionKey> {
        self.versions
            .iter()
            .filter(|r| r.is_unchanged())
            .map(|r| r.version.key())
            .collect()
    }
}

/// Applies repair edits across a book and its commentaries
pub struct VersionRepairer<'a> {
    store: &'a dyn DocumentStore,
    catalog: &'a dyn CatalogIndex,
}

impl<'a> VersionRepairer<'a> {
    pub fn new(store: &'a dyn DocumentStore, catalog: &'a dyn CatalogIndex) -> Self {
        Self { store, catalog }
    }

    /// Every version that must be repaired alongside `title`
    pub fn affected_versions(&self, title: &str) -> EditorResult<Vec<Version>> {
        let mut versions = self.store.versions(title)?;
        versions.extend(self.catalog.commentary_versions_on_book(title)?);
        Ok(versions)
    }

    /// Repair copies of every affected version. Nothing is written.
    pub fn plan(&self, title: &str, edits: &[RepairEdit]) -> EditorResult<RepairPlan> {
        let mut plan = RepairPlan::default();
        if edits.is_empty() {
            return Ok(plan);
        }

        for mut version in self.affected_versions(title)? {
            let commentary = version.title != title;
            let mut applied = 0;
            let mut skipped = 0;
            for edit in edits {
                match edit.apply(&mut version, commentary)? {
                    RepairOutcome::Applied => applied += 1,
                    RepairOutcome::AlreadyApplied => skipped += 1,
                }
            }
            if applied == 0 {
                tracing::warn!("Version '{}' already repaired, skipping", version.key());
            } else {
                tracing::debug!(
                    "Repaired '{}' ({} edits, {} already applied)",
                    version.key(),
                    applied,
                    skipped
                );
            }
            plan.versions.push(RepairedVersion { version, applied });
        }

        Ok(plan)
    }
}
