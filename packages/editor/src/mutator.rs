//! # Schema Mutator
//!
//! Coordinates a structural edit across everything that depends on a book's
//! shape:
//!
//! ```text
//! validate ─→ edit schema copies ─→ repair version copies ─→ link effects ─→ version states
//!    (phase 1: read-only, first failure aborts)
//!                                      ↓
//!                      one atomic WriteBatch ─→ catalog rebuild
//!    (phase 2)
//! ```
//!
//! Either the schema, every repaired version, every link change and the
//! regenerated version states are saved together, or nothing is.

use crate::edits::SchemaEdit;
use crate::effects::{EffectContext, LinkChanges, PostEffectEngine};
use crate::errors::{EditorError, EditorResult};
use crate::locks::BookLocks;
use crate::repairer::{RepairPlan, VersionRepairer};
use folio_schema::{Index, NodePath, SchemaNode, SchemaTree, Version, VersionKey, VersionState};
use folio_store::{CatalogIndex, DocumentStore, StoreError, WriteBatch};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Library-side editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Language of the titles used for canonical paths
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

/// Everything a mutation would write, computed without writing
#[derive(Debug, Clone)]
pub struct MutationPlan {
    pub title: String,
    pub edit: SchemaEdit,
    /// The edited index followed by any changed commentary indexes
    pub indexes: Vec<Index>,
    pub repair: RepairPlan,
    pub links: LinkChanges,
    pub states: Vec<VersionState>,
}

impl MutationPlan {
    pub fn report(&self, committed: bool) -> MutationReport {
        MutationReport {
            title: self.title.clone(),
            edit: self.edit.name().to_string(),
            indexes_saved: self.indexes.len(),
            versions_repaired: self.repair.changed().count(),
            versions_skipped: self.repair.skipped().len(),
            links_deleted: self.links.deleted.len(),
            links_rewritten: self.links.rewritten.len(),
            states_regenerated: self.states.len(),
            committed,
        }
    }

    fn into_batch(self) -> WriteBatch {
        // content is changing together with the schema
        let mut batch = WriteBatch::new().override_dependencies();
        for index in self.indexes {
            batch = batch.save_index(index);
        }
        for repaired in self.repair.versions {
            if !repaired.is_unchanged() {
                batch = batch.save_version(repaired.version);
            }
        }
        for id in self.links.deleted {
            batch = batch.delete_link(id);
        }
        for link in self.links.rewritten {
            batch = batch.save_link(link);
        }
        for state in self.states {
            batch = batch.save_state(state);
        }
        batch
    }
}

/// Summary of an applied (or checked) mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub title: String,
    pub edit: String,
    pub indexes_saved: usize,
    pub versions_repaired: usize,
    pub versions_skipped: usize,
    pub links_deleted: usize,
    pub links_rewritten: usize,
    pub states_regenerated: usize,
    pub committed: bool,
}

fn commit_failure(err: StoreError) -> EditorError {
    match err {
        StoreError::Conflict { documents } => EditorError::PartialRepairFailure {
            failed: documents,
            reason: "save conflict, nothing was written".to_string(),
        },
        StoreError::DependencyCheck(reason) => EditorError::PartialRepairFailure {
            failed: Vec::new(),
            reason,
        },
        other => EditorError::Store(other),
    }
}

/// Applies [`SchemaEdit`]s to stored books
pub struct SchemaMutator {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn CatalogIndex>,
    locks: Arc<BookLocks>,
    effects: PostEffectEngine,
    config: EditorConfig,
}

impl SchemaMutator {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<dyn CatalogIndex>) -> Self {
        Self {
            store,
            catalog,
            locks: Arc::new(BookLocks::new()),
            effects: PostEffectEngine::new(),
            config: EditorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply `edit` to the book `title` and commit every dependent change
    pub fn apply(&self, title: &str, edit: SchemaEdit) -> EditorResult<MutationReport> {
        self.apply_with(title, |_| Ok(edit))
    }

    /// Build the edit from the index as loaded under the book lock, then apply it
    fn apply_with(
        &self,
        title: &str,
        build: impl FnOnce(&Index) -> EditorResult<SchemaEdit>,
    ) -> EditorResult<MutationReport> {
        let base_title = self.store.load_index(title)?.base_title().to_string();
        self.locks.with_lock(&base_title, || -> EditorResult<MutationReport> {
            let before = self.store.load_index(title)?;
            let edit = build(&before)?;
            let plan = self.plan(before, &edit)?;
            let report = plan.report(true);
            tracing::debug!("Committing {:?}", report);

            self.store.commit(plan.into_batch()).map_err(commit_failure)?;
            self.catalog.rebuild();

            tracing::info!(
                "Applied {} to '{}': {} versions repaired, {} skipped, {} links deleted, {} links rewritten",
                report.edit,
                report.title,
                report.versions_repaired,
                report.versions_skipped,
                report.links_deleted,
                report.links_rewritten
            );
            Ok(report)
        })
    }

    /// Dry run: everything `apply` would do, without locking or writing
    pub fn check(&self, title: &str, edit: &SchemaEdit) -> EditorResult<MutationPlan> {
        self.plan(self.store.load_index(title)?, edit)
    }

    pub fn insert_child(
        &self,
        title: &str,
        parent: NodePath,
        node: SchemaNode,
        position: usize,
    ) -> EditorResult<MutationReport> {
        self.apply(
            title,
            SchemaEdit::InsertChild {
                parent,
                node,
                position,
            },
        )
    }

    pub fn insert_first_child(&self, title: &str, parent: NodePath, node: SchemaNode) -> EditorResult<MutationReport> {
        self.insert_child(title, parent, node, 0)
    }

    /// Insert after the children present once the book lock is held
    pub fn insert_last_child(&self, title: &str, parent: NodePath, node: SchemaNode) -> EditorResult<MutationReport> {
        self.apply_with(title, |index| {
            let position = index.schema.children(&parent)?.len();
            Ok(SchemaEdit::InsertChild {
                parent,
                node,
                position,
            })
        })
    }

    pub fn remove_child(&self, title: &str, path: NodePath) -> EditorResult<MutationReport> {
        self.apply(title, SchemaEdit::RemoveChild { path })
    }

    pub fn reorder_children(&self, title: &str, parent: NodePath, order: Vec<String>) -> EditorResult<MutationReport> {
        self.apply(title, SchemaEdit::ReorderChildren { parent, order })
    }

    pub fn merge_default_into_parent(&self, title: &str, parent: NodePath) -> EditorResult<MutationReport> {
        self.apply(title, SchemaEdit::MergeDefaultIntoParent { parent })
    }

    pub fn convert_simple_to_complex(&self, title: &str) -> EditorResult<MutationReport> {
        self.apply(title, SchemaEdit::ConvertSimpleToComplex)
    }

    pub fn change_parent(
        &self,
        title: &str,
        path: NodePath,
        new_parent: NodePath,
        position: usize,
    ) -> EditorResult<MutationReport> {
        self.apply(
            title,
            SchemaEdit::ChangeParent {
                path,
                new_parent,
                position,
            },
        )
    }

    pub fn change_node_title(
        &self,
        title: &str,
        path: NodePath,
        lang: &str,
        old_title: &str,
        new_title: &str,
    ) -> EditorResult<MutationReport> {
        self.apply(
            title,
            SchemaEdit::ChangeNodeTitle {
                path,
                lang: lang.to_string(),
                old_title: old_title.to_string(),
                new_title: new_title.to_string(),
            },
        )
    }

    /// Regenerate version states of a book and its commentaries, keeping flags
    pub fn refresh_version_state(&self, base_title: &str) -> EditorResult<usize> {
        self.locks.with_lock(base_title, || -> EditorResult<usize> {
            let titles = self.catalog.commentary_titles_on_book(base_title);
            let states = self.regenerate_states(base_title, &titles, &[])?;
            let count = states.len();
            let batch = states.into_iter().fold(WriteBatch::new(), WriteBatch::save_state);
            self.store.commit(batch)?;
            tracing::info!("Regenerated {} version states for '{}'", count, base_title);
            Ok(count)
        })
    }

    fn plan(&self, before: Index, edit: &SchemaEdit) -> EditorResult<MutationPlan> {
        let title = before.title.as_str();
        edit.validate(&before.schema)?;

        let mut after = before.clone();
        edit.apply(&mut after.schema)?;
        after.schema.validate()?;

        let commentary_titles = self.catalog.commentary_titles_on_book(title);
        let mut schemas: HashMap<String, SchemaTree> = HashMap::new();
        schemas.insert(after.title.clone(), after.schema.clone());
        let mut indexes = vec![after.clone()];
        for commentary_title in &commentary_titles {
            let mut commentary = self.store.load_index(commentary_title)?;
            if let Some(derived) = edit.for_commentary(&commentary.schema) {
                derived
                    .apply(&mut commentary.schema)
                    .map_err(|err| EditorError::DerivedSchemaMismatch {
                        title: commentary_title.clone(),
                        reason: err.to_string(),
                    })?;
                indexes.push(commentary.clone());
            }
            schemas.insert(commentary.title.clone(), commentary.schema);
        }

        let repairer = VersionRepairer::new(self.store.as_ref(), self.catalog.as_ref());
        let repair = repairer.plan(title, &edit.repair())?;
        for repaired in &repair.versions {
            let version = &repaired.version;
            let conforms = schemas
                .get(&version.title)
                .map_or(true, |schema| version.chapter.conforms_to(schema.root()));
            if !conforms {
                return Err(EditorError::mismatch(
                    version.key().to_string(),
                    &edit.target_path(),
                    "repaired content does not match the edited schema",
                ));
            }
        }

        let ctx = EffectContext {
            store: self.store.as_ref(),
            language: &self.config.language,
            before: &before,
            after: &after,
            commentary_titles: &commentary_titles,
        };
        let links = self.effects.analyze(edit, &ctx)?;

        let repaired: Vec<Version> = repair.changed().cloned().collect();
        let states = self.regenerate_states(title, &commentary_titles, &repaired)?;

        tracing::debug!(
            "Planned {} on '{}': {} indexes, {} versions, {} link changes",
            edit.name(),
            title,
            indexes.len(),
            repaired.len(),
            links.deleted.len() + links.rewritten.len()
        );

        Ok(MutationPlan {
            title: title.to_string(),
            edit: edit.clone(),
            indexes,
            repair,
            links,
            states,
        })
    }

    /// Fresh states from stored versions overlaid with `repaired`
    fn regenerate_states(
        &self,
        base_title: &str,
        commentary_titles: &[String],
        repaired: &[Version],
    ) -> EditorResult<Vec<VersionState>> {
        let titles = std::iter::once(base_title).chain(commentary_titles.iter().map(String::as_str));

        let mut states = Vec::new();
        for title in titles {
            let mut versions: BTreeMap<VersionKey, Version> = self
                .store
                .versions(title)?
                .into_iter()
                .map(|v| (v.key(), v))
                .collect();
            for version in repaired.iter().filter(|v| v.title == title) {
                versions.insert(version.key(), version.clone());
            }

            let existing = self.store.version_state(title)?;
            let (flags, revision) = existing
                .map(|state| (state.flags, state.revision))
                .unwrap_or_default();
            let mut state = VersionState::compute(title, flags, versions.values());
            state.revision = revision;
            states.push(state);
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_config_defaults() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_commit_conflict_maps_to_partial_failure() {
        let err = commit_failure(StoreError::Conflict {
            documents: vec!["version 'Sample [en] Base'".to_string()],
        });
        assert!(matches!(
            err,
            EditorError::PartialRepairFailure { ref failed, .. } if failed.len() == 1
        ));
    }
}
