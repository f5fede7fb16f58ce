//! # Schema Edits
//!
//! High-level structural operations on a book's schema tree.
//!
//! ## Semantics
//!
//! ### InsertChild
//! - New node gets an empty skeleton in every version
//! - Position must be in `0..=len(children)`
//!
//! ### RemoveChild
//! - Destructive: content under the node is discarded in every version
//! - Links into the removed subtree are deleted
//!
//! ### ReorderChildren
//! - Schema-only; content is addressed by key, not by position
//!
//! ### MergeDefaultIntoParent / ConvertSimpleToComplex
//! - Inverse pair: remove or introduce the `"default"` indirection
//! - Canonical paths do not change, so links are untouched
//!
//! ### ChangeParent
//! - Content moves unchanged; links under the old path are rewritten
//! - Fails if the new parent is the node itself or one of its descendants
//!
//! ### ChangeNodeTitle
//! - Replaces one title; a changed primary title rewrites links

use crate::errors::{EditorError, EditorResult};
use crate::repairer::RepairEdit;
use folio_schema::{NodeKind, NodePath, SchemaError, SchemaNode, SchemaTree, TitleGroup, DEFAULT_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structural edit of one book's schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SchemaEdit {
    /// Insert `node` under `parent` before the child at `position`
    InsertChild {
        parent: NodePath,
        node: SchemaNode,
        position: usize,
    },

    RemoveChild { path: NodePath },

    ReorderChildren { parent: NodePath, order: Vec<String> },

    /// Collapse a container holding only its default child into one content node
    MergeDefaultIntoParent { parent: NodePath },

    /// Turn a simple book (content root) into a container with a default child
    ConvertSimpleToComplex,

    ChangeParent {
        path: NodePath,
        new_parent: NodePath,
        position: usize,
    },

    ChangeNodeTitle {
        path: NodePath,
        lang: String,
        old_title: String,
        new_title: String,
    },
}

fn container_children<'t>(tree: &'t SchemaTree, path: &NodePath) -> EditorResult<&'t [SchemaNode]> {
    let node = tree.node(path)?;
    if !node.is_container() {
        return Err(SchemaError::NotAContainer(path.clone()).into());
    }
    Ok(node.children())
}

fn parent_of(path: &NodePath) -> EditorResult<NodePath> {
    path.parent().ok_or(EditorError::RootHasNoParent)
}

impl SchemaEdit {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaEdit::InsertChild { .. } => "insertChild",
            SchemaEdit::RemoveChild { .. } => "removeChild",
            SchemaEdit::ReorderChildren { .. } => "reorderChildren",
            SchemaEdit::MergeDefaultIntoParent { .. } => "mergeDefaultIntoParent",
            SchemaEdit::ConvertSimpleToComplex => "convertSimpleToComplex",
            SchemaEdit::ChangeParent { .. } => "changeParent",
            SchemaEdit::ChangeNodeTitle { .. } => "changeNodeTitle",
        }
    }

    /// Check preconditions without touching the tree
    pub fn validate(&self, tree: &SchemaTree) -> EditorResult<()> {
        match self {
            SchemaEdit::InsertChild {
                parent,
                node,
                position,
            } => {
                let children = container_children(tree, parent)?;
                if *position > children.len() {
                    return Err(SchemaError::invalid_position(parent, *position, children.len()).into());
                }
                if children.iter().any(|c| c.key == node.key) {
                    return Err(SchemaError::DuplicateKey {
                        parent: parent.clone(),
                        key: node.key.clone(),
                    }
                    .into());
                }
                SchemaTree::new(node.clone()).validate()?;
                Ok(())
            }

            SchemaEdit::RemoveChild { path } => {
                parent_of(path)?;
                tree.node(path)?;
                Ok(())
            }

            SchemaEdit::ReorderChildren { parent, order } => {
                let children = container_children(tree, parent)?;
                let current: BTreeSet<&str> = children.iter().map(|c| c.key.as_str()).collect();
                let requested: BTreeSet<&str> = order.iter().map(String::as_str).collect();
                if current != requested || order.len() != children.len() {
                    return Err(SchemaError::KeySetMismatch {
                        parent: parent.clone(),
                        expected: children.iter().map(|c| c.key.clone()).collect(),
                        found: order.clone(),
                    }
                    .into());
                }
                Ok(())
            }

            SchemaEdit::MergeDefaultIntoParent { parent } => {
                let node = tree.node(parent)?;
                if !node.has_single_default_child() {
                    return Err(EditorError::NoSingleDefaultChild(parent.clone()));
                }
                if node.default_child().and_then(SchemaNode::shape).is_none() {
                    return Err(EditorError::DefaultNotContent(parent.clone()));
                }
                Ok(())
            }

            SchemaEdit::ConvertSimpleToComplex => {
                let root = tree.root();
                if root.is_container() {
                    return Err(EditorError::NotSimpleBook(root.key.clone()));
                }
                Ok(())
            }

            SchemaEdit::ChangeParent {
                path,
                new_parent,
                position,
            } => {
                let old_parent = parent_of(path)?;
                let node = tree.node(path)?;
                if new_parent.starts_with(path) {
                    return Err(EditorError::CycleDetected {
                        node: path.clone(),
                        new_parent: new_parent.clone(),
                    });
                }
                let children = container_children(tree, new_parent)?;
                if *new_parent != old_parent {
                    if children.iter().any(|c| c.key == node.key) {
                        return Err(SchemaError::DuplicateKey {
                            parent: new_parent.clone(),
                            key: node.key.clone(),
                        }
                        .into());
                    }
                    if node.default && children.iter().any(|c| c.default) {
                        return Err(SchemaError::invalid_default(
                            new_parent,
                            "container already has a default child",
                        )
                        .into());
                    }
                }
                if *position > children.len() {
                    return Err(SchemaError::invalid_position(new_parent, *position, children.len()).into());
                }
                Ok(())
            }

            SchemaEdit::ChangeNodeTitle {
                path,
                lang,
                old_title,
                ..
            } => {
                let node = tree.node(path)?;
                if !node.titles.iter().any(|t| &t.lang == lang && &t.text == old_title) {
                    return Err(SchemaError::TitleNotFound {
                        lang: lang.clone(),
                        text: old_title.clone(),
                    }
                    .into());
                }
                Ok(())
            }
        }
    }

    /// Validate, then apply to the in-memory tree
    pub fn apply(&self, tree: &mut SchemaTree) -> EditorResult<()> {
        self.validate(tree)?;

        match self {
            SchemaEdit::InsertChild {
                parent,
                node,
                position,
            } => {
                tree.insert_child(parent, node.clone(), *position)?;
            }

            SchemaEdit::RemoveChild { path } => {
                let parent = parent_of(path)?;
                tree.remove_child(&parent, &path.keys()[path.len() - 1])?;
            }

            SchemaEdit::ReorderChildren { parent, order } => {
                tree.reorder_children(parent, order)?;
            }

            SchemaEdit::MergeDefaultIntoParent { parent } => {
                let node = tree.node(parent)?;
                let shape = node
                    .default_child()
                    .and_then(SchemaNode::shape)
                    .cloned()
                    .ok_or_else(|| EditorError::DefaultNotContent(parent.clone()))?;
                let merged = SchemaNode {
                    key: node.key.clone(),
                    titles: node.titles.clone(),
                    default: node.default,
                    kind: NodeKind::Content(shape),
                };
                tree.replace_node(parent, merged)?;
            }

            SchemaEdit::ConvertSimpleToComplex => {
                let root = tree.root();
                let default_child = SchemaNode {
                    key: DEFAULT_KEY.to_string(),
                    titles: TitleGroup::new(),
                    default: true,
                    kind: root.kind.clone(),
                };
                let container = SchemaNode {
                    key: root.key.clone(),
                    titles: root.titles.clone(),
                    default: false,
                    kind: NodeKind::Container {
                        nodes: vec![default_child],
                    },
                };
                tree.replace_node(&NodePath::root(), container)?;
            }

            SchemaEdit::ChangeParent {
                path,
                new_parent,
                position,
            } => {
                let old_parent = parent_of(path)?;
                let node = tree.remove_child(&old_parent, &path.keys()[path.len() - 1])?;
                // within the same parent the list is one shorter once the node is out
                let position = (*position).min(tree.children(new_parent)?.len());
                tree.insert_child(new_parent, node, position)?;
            }

            SchemaEdit::ChangeNodeTitle {
                path,
                lang,
                old_title,
                new_title,
            } => {
                tree.node_mut(path)?.titles.replace(lang, old_title, new_title)?;
            }
        }

        Ok(())
    }

    /// Content repairs implied by this edit, addressed in the tree before it
    pub fn repair(&self) -> Vec<RepairEdit> {
        match self {
            SchemaEdit::InsertChild { parent, node, .. } => {
                vec![RepairEdit::insert_skeleton(parent.join(node.key.clone()), node.clone())]
            }
            SchemaEdit::RemoveChild { path } => vec![RepairEdit::remove_subtree(path.clone())],
            SchemaEdit::MergeDefaultIntoParent { parent } => {
                vec![RepairEdit::collapse_default(parent.clone())]
            }
            SchemaEdit::ConvertSimpleToComplex => vec![RepairEdit::wrap_as_default(NodePath::root())],
            SchemaEdit::ChangeParent {
                path, new_parent, ..
            } => match (path.parent(), path.key()) {
                (Some(old_parent), Some(key)) if old_parent != *new_parent => {
                    vec![RepairEdit::relocate(path.clone(), new_parent.join(key))]
                }
                _ => Vec::new(),
            },
            SchemaEdit::ReorderChildren { .. } | SchemaEdit::ChangeNodeTitle { .. } => Vec::new(),
        }
    }

    /// Path of the edited node once the edit is applied
    pub fn target_path(&self) -> NodePath {
        match self {
            SchemaEdit::InsertChild { parent, node, .. } => parent.join(node.key.clone()),
            SchemaEdit::RemoveChild { path } | SchemaEdit::ChangeNodeTitle { path, .. } => path.clone(),
            SchemaEdit::ReorderChildren { parent, .. } | SchemaEdit::MergeDefaultIntoParent { parent } => {
                parent.clone()
            }
            SchemaEdit::ConvertSimpleToComplex => NodePath::root(),
            SchemaEdit::ChangeParent {
                path, new_parent, ..
            } => match path.key() {
                Some(key) => new_parent.join(key),
                None => path.clone(),
            },
        }
    }

    /// Counterpart edit for a commentary schema mirroring the edited book.
    ///
    /// Inserted nodes gain the comment level. A title change only applies
    /// when the commentary node carries the same title.
    pub fn for_commentary(&self, commentary: &SchemaTree) -> Option<SchemaEdit> {
        match self {
            SchemaEdit::InsertChild {
                parent,
                node,
                position,
            } => Some(SchemaEdit::InsertChild {
                parent: parent.clone(),
                node: node.for_commentary(),
                position: *position,
            }),
            SchemaEdit::ChangeNodeTitle {
                path,
                lang,
                old_title,
                ..
            } => {
                let carries_title = commentary
                    .node(path)
                    .map(|n| n.titles.iter().any(|t| &t.lang == lang && &t.text == old_title))
                    .unwrap_or(false);
                carries_title.then(|| self.clone())
            }
            _ => Some(self.clone()),
        }
    }
}
