//! # Cross-Reference Rewriting
//!
//! Links store references as text ("Sample, Part One, Intro 3:4"). When a
//! node's canonical path changes, every reference under the old path gets the
//! new path spliced in. Matching is by [`RefPrefix`], which respects title
//! boundaries, so unrelated books sharing a leading substring are untouched.

use crate::errors::EditorResult;
use folio_schema::{Link, RefPrefix};
use folio_store::{DocumentStore, LinkFilter, WriteBatch};
use std::collections::BTreeMap;

/// One old-path to new-path substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub old: RefPrefix,
    pub new_path: String,
}

impl PathRewrite {
    pub fn new(old: RefPrefix, new_path: impl Into<String>) -> Self {
        Self {
            old,
            new_path: new_path.into(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old.path() == self.new_path
    }
}

/// Rewritten copy of `link`, or `None` when no reference matched.
///
/// Each reference takes the first rewrite whose prefix matches it.
pub fn rewrite_link(link: &Link, rewrites: &[PathRewrite]) -> Option<Link> {
    let mut changed = false;
    let refs = link
        .refs
        .iter()
        .map(|reference| {
            let rewritten = rewrites
                .iter()
                .find_map(|r| r.old.rewrite(reference, &r.new_path));
            match rewritten {
                Some(new_ref) => {
                    changed = true;
                    new_ref
                }
                None => reference.clone(),
            }
        })
        .collect();

    changed.then(|| Link {
        refs,
        ..link.clone()
    })
}

pub struct CrossReferenceRewriter<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> CrossReferenceRewriter<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub fn links_under(&self, prefix: &RefPrefix) -> EditorResult<Vec<Link>> {
        Ok(self.store.links(&LinkFilter::Under(prefix.clone()))?)
    }

    /// Rewritten copies of every link touched by `rewrites`, unsaved
    pub fn plan(&self, rewrites: &[PathRewrite]) -> EditorResult<Vec<Link>> {
        let mut touched: BTreeMap<u64, Link> = BTreeMap::new();
        for rewrite in rewrites.iter().filter(|r| !r.is_noop()) {
            for link in self.links_under(&rewrite.old)? {
                if let Some(id) = link.id {
                    touched.entry(id).or_insert(link);
                }
            }
        }

        Ok(touched
            .values()
            .filter_map(|link| rewrite_link(link, rewrites))
            .collect())
    }

    /// Rewrite and save every link under `old`, returning how many changed
    pub fn rewrite(&self, old: &RefPrefix, new_path: &str) -> EditorResult<usize> {
        let links = self.plan(&[PathRewrite::new(old.clone(), new_path)])?;
        let count = links.len();
        if count > 0 {
            let batch = links.into_iter().fold(WriteBatch::new(), WriteBatch::save_link);
            self.store.commit(batch)?;
            tracing::info!("Rewrote {} links from '{}' to '{}'", count, old.path(), new_path);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn store_with(links: Vec<Link>) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .commit(links.into_iter().fold(WriteBatch::new(), WriteBatch::save_link))
            .unwrap();
        store
    }

    fn all_refs(store: &MemoryStore) -> Vec<Vec<String>> {
        store
            .links(&LinkFilter::All)
            .unwrap()
            .into_iter()
            .map(|l| l.refs)
            .collect()
    }

    #[test]
    fn test_rewrite_respects_title_boundaries() {
        let store = store_with(vec![
            Link::new(["Genesis 1:1", "Other 2:2"], "commentary"),
            Link::new(["Genesis Rabbah 1:1", "Other 3:3"], "midrash"),
        ]);

        let rewriter = CrossReferenceRewriter::new(&store);
        let count = rewriter
            .rewrite(&RefPrefix::container("Genesis"), "Bereshit")
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            all_refs(&store),
            vec![
                vec!["Bereshit 1:1".to_string(), "Other 2:2".to_string()],
                vec!["Genesis Rabbah 1:1".to_string(), "Other 3:3".to_string()],
            ]
        );
    }

    #[test]
    fn test_plan_combines_rewrites_per_link() {
        let store = store_with(vec![Link::new(
            ["Sample, Part One 1:1", "Notes on Sample, Part One 1:1:1"],
            "commentary",
        )]);

        let rewriter = CrossReferenceRewriter::new(&store);
        let planned = rewriter
            .plan(&[
                PathRewrite::new(RefPrefix::container("Sample, Part One"), "Sample, Part Two, Part One"),
                PathRewrite::new(
                    RefPrefix::container("Notes on Sample, Part One"),
                    "Notes on Sample, Part Two, Part One",
                ),
            ])
            .unwrap();

        assert_eq!(planned.len(), 1);
        assert_eq!(
            planned[0].refs,
            vec![
                "Sample, Part Two, Part One 1:1".to_string(),
                "Notes on Sample, Part Two, Part One 1:1:1".to_string(),
            ]
        );
        // nothing saved by planning
        assert_eq!(all_refs(&store)[0][0], "Sample, Part One 1:1");
    }

    #[test]
    fn test_noop_rewrite_touches_nothing() {
        let store = store_with(vec![Link::new(["Sample 1:1"], "x")]);
        let rewriter = CrossReferenceRewriter::new(&store);
        assert_eq!(rewriter.rewrite(&RefPrefix::leaf("Sample"), "Sample").unwrap(), 0);
        assert_eq!(store.links(&LinkFilter::All).unwrap()[0].revision, 1);
    }
}
