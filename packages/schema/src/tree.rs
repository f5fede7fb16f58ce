//! # Schema Tree
//!
//! In-memory structural tree of one book. Navigation is by [`NodePath`];
//! mutation primitives act on the in-memory tree only and leave persistence
//! to the caller.

use crate::error::{SchemaError, SchemaResult};
use crate::node::{SchemaNode, DEFAULT_KEY};
use crate::path::NodePath;
use crate::visitor::{walk_children, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A book's schema, owning the root node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaTree {
    root: SchemaNode,
}

impl SchemaTree {
    pub fn new(root: SchemaNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn node(&self, path: &NodePath) -> SchemaResult<&SchemaNode> {
        let mut node = &self.root;
        for key in path.keys() {
            node = node
                .child(key)
                .ok_or_else(|| SchemaError::NodeNotFound(path.clone()))?;
        }
        Ok(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> SchemaResult<&mut SchemaNode> {
        let mut node = &mut self.root;
        for key in path.keys() {
            node = node
                .child_mut(key)
                .ok_or_else(|| SchemaError::NodeNotFound(path.clone()))?;
        }
        Ok(node)
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.node(path).is_ok()
    }

    /// Path of the node's parent; `None` for the root
    pub fn parent(&self, path: &NodePath) -> SchemaResult<Option<NodePath>> {
        self.node(path)?;
        Ok(path.parent())
    }

    pub fn children(&self, path: &NodePath) -> SchemaResult<&[SchemaNode]> {
        Ok(self.node(path)?.children())
    }

    /// Insert `node` before the child currently at `position`.
    ///
    /// `position` must be in `0..=len(children)`.
    pub fn insert_child(
        &mut self,
        parent: &NodePath,
        node: SchemaNode,
        position: usize,
    ) -> SchemaResult<NodePath> {
        let children = self
            .node_mut(parent)?
            .children_mut()
            .ok_or_else(|| SchemaError::NotAContainer(parent.clone()))?;

        if position > children.len() {
            return Err(SchemaError::invalid_position(parent, position, children.len()));
        }
        if children.iter().any(|c| c.key == node.key) {
            return Err(SchemaError::DuplicateKey {
                parent: parent.clone(),
                key: node.key,
            });
        }
        if node.default {
            if node.key != DEFAULT_KEY {
                return Err(SchemaError::invalid_default(parent, "default child must be keyed 'default'"));
            }
            if children.iter().any(|c| c.default) {
                return Err(SchemaError::invalid_default(parent, "container already has a default child"));
            }
        }

        let path = parent.join(node.key.clone());
        children.insert(position, node);
        Ok(path)
    }

    /// Detach and return the child keyed `key`
    pub fn remove_child(&mut self, parent: &NodePath, key: &str) -> SchemaResult<SchemaNode> {
        let children = self
            .node_mut(parent)?
            .children_mut()
            .ok_or_else(|| SchemaError::NotAContainer(parent.clone()))?;
        let position = children
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| SchemaError::NodeNotFound(parent.join(key)))?;
        Ok(children.remove(position))
    }

    /// Reassign child order; `new_order` must be a permutation of the child keys
    pub fn reorder_children(&mut self, parent: &NodePath, new_order: &[String]) -> SchemaResult<()> {
        let children = self
            .node_mut(parent)?
            .children_mut()
            .ok_or_else(|| SchemaError::NotAContainer(parent.clone()))?;

        let current: BTreeSet<&str> = children.iter().map(|c| c.key.as_str()).collect();
        let requested: BTreeSet<&str> = new_order.iter().map(String::as_str).collect();
        if current != requested || new_order.len() != children.len() {
            return Err(SchemaError::KeySetMismatch {
                parent: parent.clone(),
                expected: children.iter().map(|c| c.key.clone()).collect(),
                found: new_order.to_vec(),
            });
        }

        let mut remaining = std::mem::take(children);
        for key in new_order {
            if let Some(position) = remaining.iter().position(|c| &c.key == key) {
                children.push(remaining.swap_remove(position));
            }
        }
        Ok(())
    }

    /// Swap the node at `path` for `node`, returning the old node
    pub fn replace_node(&mut self, path: &NodePath, node: SchemaNode) -> SchemaResult<SchemaNode> {
        let slot = self.node_mut(path)?;
        Ok(std::mem::replace(slot, node))
    }

    pub fn is_default_child(&self, path: &NodePath) -> SchemaResult<bool> {
        Ok(self.node(path)?.default)
    }

    pub fn has_single_default_child(&self, path: &NodePath) -> SchemaResult<bool> {
        Ok(self.node(path)?.has_single_default_child())
    }

    /// Title suffix appended to a book title to form the node's canonical path.
    ///
    /// Default nodes add nothing; other nodes add `", {primary title}"` in
    /// `lang`, falling back to their key.
    pub fn path_suffix(&self, path: &NodePath, lang: &str) -> SchemaResult<String> {
        let mut suffix = String::new();
        let mut node = &self.root;
        for key in path.keys() {
            node = node
                .child(key)
                .ok_or_else(|| SchemaError::NodeNotFound(path.clone()))?;
            if node.default {
                continue;
            }
            suffix.push_str(", ");
            suffix.push_str(node.titles.primary_title(lang).unwrap_or(&node.key));
        }
        Ok(suffix)
    }

    /// Check structural invariants over the whole tree
    pub fn validate(&self) -> SchemaResult<()> {
        let mut validator = TreeValidator { error: None };
        validator.visit_node(&NodePath::root(), &self.root);
        match validator.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct TreeValidator {
    error: Option<SchemaError>,
}

impl TreeValidator {
    fn check(&self, path: &NodePath, node: &SchemaNode) -> SchemaResult<()> {
        node.titles.validate()?;

        let mut keys = BTreeSet::new();
        for child in node.children() {
            if !keys.insert(child.key.as_str()) {
                return Err(SchemaError::DuplicateKey {
                    parent: path.clone(),
                    key: child.key.clone(),
                });
            }
            if child.default && child.key != DEFAULT_KEY {
                return Err(SchemaError::invalid_default(path, "default child must be keyed 'default'"));
            }
        }
        if node.children().iter().filter(|c| c.default).count() > 1 {
            return Err(SchemaError::invalid_default(path, "more than one default child"));
        }
        Ok(())
    }
}

impl Visitor for TreeValidator {
    fn visit_container(&mut self, path: &NodePath, node: &SchemaNode) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.check(path, node) {
            self.error = Some(err);
            return;
        }
        walk_children(self, path, node);
    }

    fn visit_content(&mut self, path: &NodePath, node: &SchemaNode) {
        if self.error.is_none() {
            if let Err(err) = self.check(path, node) {
                self.error = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContentShape;
    use pretty_assertions::assert_eq;

    fn shape() -> ContentShape {
        ContentShape::integers(["Chapter", "Verse"])
    }

    fn sample_tree() -> SchemaTree {
        SchemaTree::new(
            SchemaNode::container(
                "Sample",
                vec![
                    SchemaNode::content("intro", shape()).with_title("en", "Introduction"),
                    SchemaNode::container(
                        "part",
                        vec![SchemaNode::content("one", shape()).with_title("en", "One")],
                    )
                    .with_title("en", "Part"),
                ],
            )
            .with_title("en", "Sample"),
        )
    }

    fn keys(tree: &SchemaTree, path: &NodePath) -> Vec<String> {
        tree.children(path).unwrap().iter().map(|c| c.key.clone()).collect()
    }

    #[test]
    fn test_navigation() {
        let tree = sample_tree();
        let one = NodePath::new(["part", "one"]);
        assert_eq!(tree.node(&one).unwrap().key, "one");
        assert_eq!(tree.parent(&one).unwrap(), Some(NodePath::new(["part"])));
        assert_eq!(tree.parent(&NodePath::root()).unwrap(), None);
        assert!(matches!(
            tree.node(&NodePath::new(["missing"])),
            Err(SchemaError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_insert_child_at_end() {
        let mut tree = sample_tree();
        let path = tree
            .insert_child(&NodePath::root(), SchemaNode::content("appendix", shape()), 2)
            .unwrap();
        assert_eq!(path, NodePath::new(["appendix"]));
        assert_eq!(keys(&tree, &NodePath::root()), vec!["intro", "part", "appendix"]);
    }

    #[test]
    fn test_insert_child_rejects_out_of_range_position() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let err = tree
            .insert_child(&NodePath::root(), SchemaNode::content("appendix", shape()), 3)
            .unwrap_err();
        assert_eq!(err, SchemaError::invalid_position(&NodePath::root(), 3, 2));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_insert_child_rejects_duplicate_key() {
        let mut tree = sample_tree();
        let err = tree
            .insert_child(&NodePath::root(), SchemaNode::content("intro", shape()), 0)
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateKey { .. }));
    }

    #[test]
    fn test_insert_into_content_fails() {
        let mut tree = sample_tree();
        let err = tree
            .insert_child(&NodePath::new(["intro"]), SchemaNode::content("x", shape()), 0)
            .unwrap_err();
        assert_eq!(err, SchemaError::NotAContainer(NodePath::new(["intro"])));
    }

    #[test]
    fn test_remove_child() {
        let mut tree = sample_tree();
        let removed = tree.remove_child(&NodePath::root(), "intro").unwrap();
        assert_eq!(removed.key, "intro");
        assert_eq!(keys(&tree, &NodePath::root()), vec!["part"]);
    }

    #[test]
    fn test_reorder_children() {
        let mut tree = sample_tree();
        tree.reorder_children(&NodePath::root(), &["part".to_string(), "intro".to_string()])
            .unwrap();
        assert_eq!(keys(&tree, &NodePath::root()), vec!["part", "intro"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut tree = sample_tree();
        let err = tree
            .reorder_children(&NodePath::root(), &["part".to_string(), "part".to_string()])
            .unwrap_err();
        assert!(matches!(err, SchemaError::KeySetMismatch { .. }));

        let err = tree
            .reorder_children(&NodePath::root(), &["part".to_string()])
            .unwrap_err();
        assert!(matches!(err, SchemaError::KeySetMismatch { .. }));
        assert_eq!(keys(&tree, &NodePath::root()), vec!["intro", "part"]);
    }

    #[test]
    fn test_path_suffix_skips_default_nodes() {
        let tree = SchemaTree::new(SchemaNode::container(
            "Sample",
            vec![SchemaNode::default_content(shape())],
        ));
        assert_eq!(tree.path_suffix(&NodePath::new(["default"]), "en").unwrap(), "");

        let tree = sample_tree();
        assert_eq!(
            tree.path_suffix(&NodePath::new(["part", "one"]), "en").unwrap(),
            ", Part, One"
        );
    }

    #[test]
    fn test_default_child_rules() {
        let mut tree = sample_tree();
        let mut stray = SchemaNode::content("other", shape());
        stray.default = true;
        let err = tree.insert_child(&NodePath::root(), stray, 0).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefaultChild { .. }));

        tree.insert_child(&NodePath::root(), SchemaNode::default_content(shape()), 0)
            .unwrap();
        assert!(tree.is_default_child(&NodePath::new(["default"])).unwrap());
        assert!(!tree.has_single_default_child(&NodePath::root()).unwrap());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_validate_detects_duplicate_siblings() {
        let tree = SchemaTree::new(SchemaNode::container(
            "Sample",
            vec![
                SchemaNode::content("a", shape()),
                SchemaNode::content("a", shape()),
            ],
        ));
        assert!(matches!(tree.validate(), Err(SchemaError::DuplicateKey { .. })));
    }
}
