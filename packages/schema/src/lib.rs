//! # Folio Schema
//!
//! Data model for book structure and stored text.
//!
//! ```text
//! Index ── SchemaTree ── SchemaNode (container | content leaf)
//!   │
//!   ├── Version* ── Chapter (mirrors the tree, addressed by NodePath)
//!   ├── Link*    ── textual refs ("Sample, Part Two 3:4")
//!   └── VersionState (derived, regenerated after structural edits)
//! ```

pub mod chapter;
pub mod error;
pub mod node;
pub mod path;
pub mod record;
pub mod refs;
pub mod tree;
pub mod visitor;

pub use chapter::Chapter;
pub use error::{SchemaError, SchemaResult};
pub use node::{ContentShape, NodeKind, SchemaNode, Title, TitleGroup, COMMENT_SECTION, DEFAULT_KEY};
pub use path::NodePath;
pub use record::{Index, LanguageState, Link, LinkId, Version, VersionKey, VersionState};
pub use refs::RefPrefix;
pub use tree::SchemaTree;
pub use visitor::{walk_children, walk_node, Visitor};
