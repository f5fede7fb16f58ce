//! # Content Addressing
//!
//! A version's `chapter` mirrors the schema: containers are mappings keyed by
//! child key, content leaves are nested sequences. The content of the node at
//! a [`NodePath`] is therefore found by following the path's keys from the
//! content root. The default child is keyed `"default"`, so the transitional
//! single-default representation needs no special casing.
//!
//! A missing ancestor means schema and content have already diverged. That is
//! reported as [`EditorError::AddressingMismatch`] and never repaired here.

use crate::errors::{EditorError, EditorResult};
use folio_schema::{Chapter, NodePath, Version};
use std::collections::BTreeMap;

/// Mutable view of the content slot for one schema node
#[derive(Debug)]
pub enum ContentSlice<'a> {
    /// The whole chapter of the version (the schema root)
    Root(&'a mut Chapter),

    /// Entry `key` of the parent's mapping; the entry itself may be absent
    Entry {
        map: &'a mut BTreeMap<String, Chapter>,
        key: String,
    },
}

impl ContentSlice<'_> {
    pub fn get(&self) -> Option<&Chapter> {
        match self {
            ContentSlice::Root(chapter) => Some(&**chapter),
            ContentSlice::Entry { map, key } => map.get(key),
        }
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Store `content` in the slot, returning what was there
    pub fn set(&mut self, content: Chapter) -> Option<Chapter> {
        match self {
            ContentSlice::Root(chapter) => Some(std::mem::replace(&mut **chapter, content)),
            ContentSlice::Entry { map, key } => map.insert(key.clone(), content),
        }
    }

    /// Remove the content from the slot. The root is left as an empty leaf.
    pub fn delete(&mut self) -> Option<Chapter> {
        match self {
            ContentSlice::Root(chapter) => Some(std::mem::take(&mut **chapter)),
            ContentSlice::Entry { map, key } => map.remove(key.as_str()),
        }
    }
}

/// Locates node content inside stored versions
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAddressor;

impl ContentAddressor {
    /// Slot for the node at `path` in `version`.
    ///
    /// Every ancestor must be present as a mapping; the node's own entry may
    /// be absent so the slot can be used for insertion.
    pub fn locate<'a>(version: &'a mut Version, path: &NodePath) -> EditorResult<ContentSlice<'a>> {
        let Some((key, ancestors)) = path.keys().split_last() else {
            return Ok(ContentSlice::Root(&mut version.chapter));
        };

        let label = version.key().to_string();
        let mut current = &mut version.chapter;
        for (depth, ancestor) in ancestors.iter().enumerate() {
            let map = current.as_branch_mut().ok_or_else(|| {
                EditorError::mismatch(&label, path, format!("content at depth {} is not a mapping", depth))
            })?;
            current = map.get_mut(ancestor).ok_or_else(|| {
                EditorError::mismatch(&label, path, format!("missing key '{}'", ancestor))
            })?;
        }

        let map = current.as_branch_mut().ok_or_else(|| {
            EditorError::mismatch(&label, path, "parent content is not a mapping")
        })?;
        Ok(ContentSlice::Entry {
            map,
            key: key.clone(),
        })
    }

    /// Read-only lookup of the content at `path`
    pub fn get<'a>(version: &'a Version, path: &NodePath) -> EditorResult<Option<&'a Chapter>> {
        let mut current = &version.chapter;
        for (depth, key) in path.keys().iter().enumerate() {
            let map = current.as_branch().ok_or_else(|| {
                EditorError::mismatch(
                    version.key().to_string(),
                    path,
                    format!("content at depth {} is not a mapping", depth),
                )
            })?;
            match map.get(key) {
                Some(next) => current = next,
                None if depth + 1 == path.len() => return Ok(None),
                None => {
                    return Err(EditorError::mismatch(
                        version.key().to_string(),
                        path,
                        format!("missing key '{}'", key),
                    ))
                }
            }
        }
        Ok(Some(current))
    }
}
