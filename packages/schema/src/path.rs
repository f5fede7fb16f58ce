//! Key paths into a schema tree.
//!
//! A node is addressed by the keys walked from the root to reach it. The root
//! itself is the empty path. Because content inside a [`Version`](crate::Version)
//! is nested by the same keys, a `NodePath` doubles as the content address of
//! the node's slice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequence of child keys leading from the root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// The root path
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Last key, `None` for the root
    pub fn key(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path of the containing node, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        self.0
            .split_last()
            .map(|(_, ancestors)| NodePath(ancestors.to_vec()))
    }

    pub fn join(&self, key: impl Into<String>) -> NodePath {
        let mut keys = self.0.clone();
        keys.push(key.into());
        NodePath(keys)
    }

    /// True when `self` is `other` or lies underneath it
    pub fn starts_with(&self, other: &NodePath) -> bool {
        self.0.starts_with(&other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for key in &self.0 {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = std::convert::Infallible;

    /// Parses `/a/b`, `a/b` or `/` (root)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodePath::new(s.split('/').filter(|k| !k.is_empty())))
    }
}
