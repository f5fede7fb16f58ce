//! Persisted records: book indexes, text versions, links and version state.

use crate::chapter::Chapter;
use crate::error::SchemaResult;
use crate::path::NodePath;
use crate::refs::RefPrefix;
use crate::tree::SchemaTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Book-level record owning the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub title: String,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Books this one comments on; empty for a base text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_text_titles: Vec<String>,

    pub schema: SchemaTree,

    #[serde(default)]
    pub revision: u64,
}

impl Index {
    pub fn new(title: impl Into<String>, schema: SchemaTree) -> Self {
        Self {
            title: title.into(),
            categories: Vec::new(),
            base_text_titles: Vec::new(),
            schema,
            revision: 0,
        }
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this index as a commentary on `base_title`
    pub fn commentary_on(mut self, base_title: impl Into<String>) -> Self {
        self.base_text_titles = vec![base_title.into()];
        self
    }

    pub fn is_commentary(&self) -> bool {
        !self.base_text_titles.is_empty()
    }

    /// Title whose lock guards structural edits to this book
    pub fn base_title(&self) -> &str {
        self.base_text_titles.first().unwrap_or(&self.title)
    }

    /// Canonical textual path of the node at `path`
    pub fn canonical_path(&self, path: &NodePath, lang: &str) -> SchemaResult<String> {
        Ok(format!("{}{}", self.title, self.schema.path_suffix(path, lang)?))
    }

    /// Prefix selecting references underneath the node at `path`
    pub fn ref_prefix(&self, path: &NodePath, lang: &str) -> SchemaResult<RefPrefix> {
        let canonical = self.canonical_path(path, lang)?;
        Ok(if self.schema.node(path)?.is_container() {
            RefPrefix::container(canonical)
        } else {
            RefPrefix::leaf(canonical)
        })
    }
}

/// Identity of a version: book title, language and edition name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionKey {
    pub title: String,
    pub language: String,
    pub version_title: String,
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.title, self.language, self.version_title)
    }
}

/// One stored text instance of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub title: String,
    pub language: String,
    pub version_title: String,
    pub chapter: Chapter,
    #[serde(default)]
    pub revision: u64,
}

impl Version {
    pub fn new(
        title: impl Into<String>,
        language: impl Into<String>,
        version_title: impl Into<String>,
        chapter: Chapter,
    ) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
            version_title: version_title.into(),
            chapter,
            revision: 0,
        }
    }

    pub fn key(&self) -> VersionKey {
        VersionKey {
            title: self.title.clone(),
            language: self.language.clone(),
            version_title: self.version_title.clone(),
        }
    }
}

pub type LinkId = u64;

/// Association between two or more textual references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LinkId>,
    pub refs: Vec<String>,
    #[serde(default)]
    pub link_type: String,
    #[serde(default)]
    pub revision: u64,
}

impl Link {
    pub fn new<S: Into<String>>(refs: impl IntoIterator<Item = S>, link_type: impl Into<String>) -> Self {
        Self {
            id: None,
            refs: refs.into_iter().map(Into::into).collect(),
            link_type: link_type.into(),
            revision: 0,
        }
    }

    /// Whether any reference lies under `prefix`
    pub fn references(&self, prefix: &RefPrefix) -> bool {
        self.refs.iter().any(|r| prefix.matches(r))
    }
}

/// Per-language statistics of a book's versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageState {
    pub versions: usize,
    /// Largest non-empty segment count across the language's versions
    pub segments: usize,
}

/// Derived, non-authoritative summary per book title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionState {
    pub title: String,
    #[serde(default)]
    pub flags: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageState>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub revision: u64,
}

impl VersionState {
    /// Compute a fresh state from `versions`, keeping `flags`
    pub fn compute<'a>(
        title: impl Into<String>,
        flags: BTreeMap<String, serde_json::Value>,
        versions: impl IntoIterator<Item = &'a Version>,
    ) -> Self {
        let mut languages: BTreeMap<String, LanguageState> = BTreeMap::new();
        for version in versions {
            let state = languages.entry(version.language.clone()).or_default();
            state.versions += 1;
            state.segments = state.segments.max(version.chapter.segment_count());
        }
        Self {
            title: title.into(),
            flags,
            languages,
            generated_at: Utc::now(),
            revision: 0,
        }
    }
}
