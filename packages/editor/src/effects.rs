//! # Post-Effect System
//!
//! Schema edits trigger link maintenance so that no stored reference is left
//! dangling or pointing at a stale path:
//! - Removing a node deletes every link into its subtree
//! - Moving a node rewrites links under its old path
//! - Changing a primary title rewrites links under the old title
//!
//! Effects only analyze; the mutator commits their [`LinkChanges`] in the same
//! batch as the schema and content changes. Commentary books are covered by
//! deriving their canonical paths from the same suffix as the base book.

use crate::edits::SchemaEdit;
use crate::errors::EditorResult;
use crate::rewriter::{CrossReferenceRewriter, PathRewrite};
use folio_schema::{Index, Link, LinkId, NodePath, RefPrefix};
use folio_store::DocumentStore;
use std::collections::BTreeSet;

/// What an effect can see while analyzing an edit
pub struct EffectContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub language: &'a str,
    /// The edited book before the edit
    pub before: &'a Index,
    /// The edited book with the edit applied
    pub after: &'a Index,
    pub commentary_titles: &'a [String],
}

impl EffectContext<'_> {
    /// Prefixes selecting refs under `path` in the book and its commentaries
    pub fn prefixes(&self, index: &Index, path: &NodePath) -> EditorResult<Vec<RefPrefix>> {
        let base = index.ref_prefix(path, self.language)?;
        let suffix = index.schema.path_suffix(path, self.language)?;
        let is_container = index.schema.node(path)?.is_container();

        let mut prefixes = vec![base];
        for title in self.commentary_titles {
            let canonical = format!("{}{}", title, suffix);
            prefixes.push(if is_container {
                RefPrefix::container(canonical)
            } else {
                RefPrefix::leaf(canonical)
            });
        }
        Ok(prefixes)
    }

    /// Rewrites from the node at `old` before the edit to `new` after it
    pub fn path_rewrites(&self, old: &NodePath, new: &NodePath) -> EditorResult<Vec<PathRewrite>> {
        let old_prefixes = self.prefixes(self.before, old)?;
        let new_prefixes = self.prefixes(self.after, new)?;
        Ok(old_prefixes
            .into_iter()
            .zip(new_prefixes)
            .map(|(old, new)| PathRewrite::new(old, new.path()))
            .filter(|r| !r.is_noop())
            .collect())
    }
}

/// Link writes produced by post-effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkChanges {
    pub deleted: BTreeSet<LinkId>,
    pub rewritten: Vec<Link>,
}

impl LinkChanges {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.rewritten.is_empty()
    }

    pub fn merge(&mut self, other: LinkChanges) {
        self.deleted.extend(other.deleted);
        for link in other.rewritten {
            if !link.id.is_some_and(|id| self.deleted.contains(&id)) {
                self.rewritten.push(link);
            }
        }
    }
}

/// Post-effect that can be triggered by a schema edit
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    /// Analyze the edit and produce the link changes it requires
    fn analyze(&self, edit: &SchemaEdit, ctx: &EffectContext<'_>) -> EditorResult<LinkChanges>;
}

/// Delete links into a removed subtree
#[derive(Debug)]
pub struct CleanupOrphanedLinks;

impl PostEffect for CleanupOrphanedLinks {
    fn analyze(&self, edit: &SchemaEdit, ctx: &EffectContext<'_>) -> EditorResult<LinkChanges> {
        let SchemaEdit::RemoveChild { path } = edit else {
            return Ok(LinkChanges::default());
        };

        let rewriter = CrossReferenceRewriter::new(ctx.store);
        let mut changes = LinkChanges::default();
        for prefix in ctx.prefixes(ctx.before, path)? {
            // the whole link goes, not just the matching ref
            changes
                .deleted
                .extend(rewriter.links_under(&prefix)?.into_iter().filter_map(|l| l.id));
        }
        Ok(changes)
    }
}

/// Rewrite links under a moved node
#[derive(Debug)]
pub struct ReparentLinks;

impl PostEffect for ReparentLinks {
    fn analyze(&self, edit: &SchemaEdit, ctx: &EffectContext<'_>) -> EditorResult<LinkChanges> {
        let SchemaEdit::ChangeParent { path, .. } = edit else {
            return Ok(LinkChanges::default());
        };

        let rewrites = ctx.path_rewrites(path, &edit.target_path())?;
        Ok(LinkChanges {
            deleted: BTreeSet::new(),
            rewritten: CrossReferenceRewriter::new(ctx.store).plan(&rewrites)?,
        })
    }
}

/// Rewrite links when a node's canonical title changes
#[derive(Debug)]
pub struct RetitleLinks;

impl PostEffect for RetitleLinks {
    fn analyze(&self, edit: &SchemaEdit, ctx: &EffectContext<'_>) -> EditorResult<LinkChanges> {
        let SchemaEdit::ChangeNodeTitle { path, .. } = edit else {
            return Ok(LinkChanges::default());
        };

        // non-primary titles and other languages leave paths unchanged
        let rewrites = ctx.path_rewrites(path, path)?;
        Ok(LinkChanges {
            deleted: BTreeSet::new(),
            rewritten: CrossReferenceRewriter::new(ctx.store).plan(&rewrites)?,
        })
    }
}

/// Post-effect engine that runs all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![
                Box::new(CleanupOrphanedLinks),
                Box::new(ReparentLinks),
                Box::new(RetitleLinks),
            ],
        }
    }

    /// Analyze an edit with every effect
    pub fn analyze(&self, edit: &SchemaEdit, ctx: &EffectContext<'_>) -> EditorResult<LinkChanges> {
        let mut changes = LinkChanges::default();
        for effect in &self.effects {
            changes.merge(effect.analyze(edit, ctx)?);
        }
        Ok(changes)
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}
