//! # Folio Editor
//!
//! Structural editing engine for book schemas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: SchemaTree, Chapter, Index, Link    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: structural edits                    │
//! │  - SchemaEdit validation and tree updates   │
//! │  - ContentAddressor / VersionRepairer       │
//! │  - Link post-effects and ref rewriting      │
//! │  - Per-book locks, two-phase commit         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: atomic WriteBatch, catalog rebuild   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Schema is source of truth**: version content and links follow it
//! 2. **No partial commits**: every dependent write lands in one batch
//! 3. **Derived state is rebuilt**: version states are regenerated, never patched
//! 4. **Safe retries**: repairs re-check content shape before writing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{SchemaEdit, SchemaMutator};
//! use folio_schema::NodePath;
//!
//! let mutator = SchemaMutator::new(store, catalog);
//!
//! // Preview
//! let plan = mutator.check("Sample", &edit)?;
//! println!("{} versions to repair", plan.report(false).versions_repaired);
//!
//! // Apply
//! mutator.change_parent("Sample", NodePath::new(["one", "intro"]), NodePath::new(["two"]), 0)?;
//! ```

mod addressor;
mod edits;
mod effects;
mod errors;
mod locks;
mod mutator;
mod repairer;
mod rewriter;

pub use addressor::{ContentAddressor, ContentSlice};
pub use edits::SchemaEdit;
pub use effects::{CleanupOrphanedLinks, EffectContext, LinkChanges, PostEffect, PostEffectEngine, ReparentLinks, RetitleLinks};
pub use errors::{EditorError, EditorResult};
pub use locks::BookLocks;
pub use mutator::{EditorConfig, MutationPlan, MutationReport, SchemaMutator};
pub use repairer::{RepairEdit, RepairOutcome, RepairPlan, RepairedVersion, VersionRepairer};
pub use rewriter::{rewrite_link, CrossReferenceRewriter, PathRewrite};
