//! # Library Catalog
//!
//! Title and category lookup cache shared by the rest of the application.
//! The cache is derived from stored indexes and is refreshed explicitly with
//! [`CatalogIndex::rebuild`] after every structural commit.

use crate::error::StoreResult;
use crate::DocumentStore;
use folio_schema::Version;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Library-wide lookups consumed by the schema editor
pub trait CatalogIndex: Send + Sync {
    /// Refresh in-memory lookup caches from the store
    fn rebuild(&self);

    /// Titles of commentary books on `title`
    fn commentary_titles_on_book(&self, title: &str) -> Vec<String>;

    /// Every version of every commentary book on `title`
    fn commentary_versions_on_book(&self, title: &str) -> StoreResult<Vec<Version>>;
}

#[derive(Debug, Default)]
struct TitleCache {
    generation: u64,
    categories: BTreeMap<String, Vec<String>>,
    commentaries: BTreeMap<String, Vec<String>>,
}

/// Catalog backed by a [`DocumentStore`]
pub struct Library {
    store: Arc<dyn DocumentStore>,
    cache: RwLock<TitleCache>,
}

impl Library {
    /// Create a library and build its cache
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let library = Self {
            store,
            cache: RwLock::new(TitleCache::default()),
        };
        library.rebuild();
        library
    }

    /// Number of completed rebuilds
    pub fn generation(&self) -> u64 {
        self.cache.read().generation
    }

    pub fn titles(&self) -> Vec<String> {
        self.cache.read().categories.keys().cloned().collect()
    }

    pub fn categories(&self, title: &str) -> Option<Vec<String>> {
        self.cache.read().categories.get(title).cloned()
    }
}

impl CatalogIndex for Library {
    fn rebuild(&self) {
        let indexes = match self.store.indexes() {
            Ok(indexes) => indexes,
            Err(err) => {
                tracing::warn!("Library rebuild failed, keeping previous cache: {}", err);
                return;
            }
        };

        let mut categories = BTreeMap::new();
        let mut commentaries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for index in indexes {
            for base in &index.base_text_titles {
                commentaries
                    .entry(base.clone())
                    .or_default()
                    .push(index.title.clone());
            }
            categories.insert(index.title, index.categories);
        }

        let mut cache = self.cache.write();
        cache.generation += 1;
        cache.categories = categories;
        cache.commentaries = commentaries;
        tracing::debug!(
            "Library rebuilt (generation {}, {} titles)",
            cache.generation,
            cache.categories.len()
        );
    }

    fn commentary_titles_on_book(&self, title: &str) -> Vec<String> {
        self.cache
            .read()
            .commentaries
            .get(title)
            .cloned()
            .unwrap_or_default()
    }

    fn commentary_versions_on_book(&self, title: &str) -> StoreResult<Vec<Version>> {
        let mut versions = Vec::new();
        for commentary in self.commentary_titles_on_book(title) {
            versions.extend(self.store.versions(&commentary)?);
        }
        Ok(versions)
    }
}
