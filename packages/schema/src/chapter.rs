//! Stored text content.
//!
//! A version's content mirrors the schema: a content leaf of depth `d` holds a
//! jagged array nested `d` levels deep with text segments at the bottom, and a
//! container holds a mapping from child key to that child's content.

use crate::node::{NodeKind, SchemaNode, DEFAULT_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content of one node inside a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Chapter {
    /// A single text segment
    Segment(String),
    /// One level of a jagged array
    Leaf(Vec<Chapter>),
    /// Child key to child content
    Branch(BTreeMap<String, Chapter>),
}

impl Default for Chapter {
    fn default() -> Self {
        Chapter::Leaf(Vec::new())
    }
}

impl Chapter {
    /// Empty content matching the node's addressing shape
    pub fn skeleton(node: &SchemaNode) -> Chapter {
        match &node.kind {
            NodeKind::Content(shape) => {
                let mut chapter = Chapter::Leaf(Vec::new());
                for _ in 1..shape.depth() {
                    chapter = Chapter::Leaf(vec![chapter]);
                }
                chapter
            }
            NodeKind::Container { nodes } => Chapter::Branch(
                nodes
                    .iter()
                    .map(|child| (child.key.clone(), Chapter::skeleton(child)))
                    .collect(),
            ),
        }
    }

    /// `{"default": content}`
    pub fn wrap_default(content: Chapter) -> Chapter {
        Chapter::Branch(BTreeMap::from([(DEFAULT_KEY.to_string(), content)]))
    }

    /// Inner content when this is exactly `{"default": content}`
    pub fn default_only(&self) -> Option<&Chapter> {
        match self {
            Chapter::Branch(map) if map.len() == 1 => map.get(DEFAULT_KEY),
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BTreeMap<String, Chapter>> {
        match self {
            Chapter::Branch(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_branch_mut(&mut self) -> Option<&mut BTreeMap<String, Chapter>> {
        match self {
            Chapter::Branch(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this content fits the node's shape
    pub fn conforms_to(&self, node: &SchemaNode) -> bool {
        match (&node.kind, self) {
            (NodeKind::Content(shape), _) => self.fits_depth(shape.depth()),
            (NodeKind::Container { nodes }, Chapter::Branch(map)) => map.iter().all(|(key, content)| {
                nodes
                    .iter()
                    .find(|child| &child.key == key)
                    .is_some_and(|child| content.conforms_to(child))
            }),
            (NodeKind::Container { .. }, _) => false,
        }
    }

    fn fits_depth(&self, depth: usize) -> bool {
        match self {
            Chapter::Segment(_) => depth == 0,
            Chapter::Leaf(items) => depth > 0 && items.iter().all(|item| item.fits_depth(depth - 1)),
            Chapter::Branch(_) => false,
        }
    }

    /// Number of non-empty text segments
    pub fn segment_count(&self) -> usize {
        match self {
            Chapter::Segment(text) => usize::from(!text.trim().is_empty()),
            Chapter::Leaf(items) => items.iter().map(Chapter::segment_count).sum(),
            Chapter::Branch(map) => map.values().map(Chapter::segment_count).sum(),
        }
    }
}
