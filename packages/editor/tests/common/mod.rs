//! Shared fixtures for the editor integration tests

#![allow(dead_code)]

use folio_editor::SchemaMutator;
use folio_schema::{Chapter, ContentShape, Index, Link, SchemaNode, SchemaTree, Version, VersionState};
use folio_store::{DocumentStore, Library, LinkFilter, MemoryStore, WriteBatch};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const BOOK: &str = "Sample";
pub const COMMENTARY: &str = "Notes on Sample";

pub fn verses() -> ContentShape {
    ContentShape::integers(["Chapter", "Verse"])
}

pub fn chapter(value: Value) -> Chapter {
    serde_json::from_value(value).unwrap()
}

/// Sample
/// ├── one   "Part One"
/// │   └── intro "Intro" (Chapter, Verse)
/// └── two   "Part Two"
///     └── body  "Body"  (Chapter, Verse)
pub fn complex_schema() -> SchemaTree {
    SchemaTree::new(
        SchemaNode::container(
            BOOK,
            vec![
                SchemaNode::container(
                    "one",
                    vec![SchemaNode::content("intro", verses()).with_title("en", "Intro")],
                )
                .with_title("en", "Part One"),
                SchemaNode::container(
                    "two",
                    vec![SchemaNode::content("body", verses()).with_title("en", "Body")],
                )
                .with_title("en", "Part Two"),
            ],
        )
        .with_title("en", BOOK),
    )
}

pub fn complex_versions() -> Vec<Version> {
    vec![
        Version::new(
            BOOK,
            "en",
            "Base",
            chapter(json!({"one": {"intro": [["a", "b"], ["c"]]}, "two": {"body": [["d"]]}})),
        ),
        Version::new(
            BOOK,
            "he",
            "Hebrew",
            chapter(json!({"one": {"intro": [["alef"]]}, "two": {"body": []}})),
        ),
    ]
}

pub fn commentary_index() -> Index {
    Index::new(COMMENTARY, SchemaTree::new(complex_schema().root().for_commentary())).commentary_on(BOOK)
}

pub fn commentary_version() -> Version {
    Version::new(
        COMMENTARY,
        "en",
        "Notes",
        chapter(json!({"one": {"intro": [[["note"]]]}, "two": {"body": []}})),
    )
}

pub fn sample_links() -> Vec<Link> {
    vec![
        Link::new(["Sample, Part One, Intro 1:1", "Other 2:2"], "commentary"),
        Link::new(["Sample, Part Two, Body 1:1", "Other 3:3"], "quotation"),
        Link::new(["Notes on Sample, Part One, Intro 1:1:1", "Sample, Part One, Intro 1:1"], "commentary"),
        Link::new(["Sample Rabbah 1:1", "Other 4:4"], "midrash"),
    ]
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub library: Arc<Library>,
    pub mutator: SchemaMutator,
}

impl Fixture {
    pub fn new(indexes: Vec<Index>, versions: Vec<Version>, links: Vec<Link>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        for index in indexes {
            batch = batch.save_index(index);
        }
        for version in versions {
            batch = batch.save_version(version);
        }
        for link in links {
            batch = batch.save_link(link);
        }
        store.commit(batch).unwrap();

        let library = Arc::new(Library::new(store.clone()));
        let mutator = SchemaMutator::new(store.clone(), library.clone());
        Self {
            store,
            library,
            mutator,
        }
    }

    /// Complex book with two versions, no commentary
    pub fn complex() -> Self {
        Self::new(vec![Index::new(BOOK, complex_schema())], complex_versions(), sample_links())
    }

    /// Complex book plus a commentary mirroring it
    pub fn with_commentary() -> Self {
        let mut versions = complex_versions();
        versions.push(commentary_version());
        Self::new(
            vec![Index::new(BOOK, complex_schema()), commentary_index()],
            versions,
            sample_links(),
        )
    }

    /// Root container with a single default child
    pub fn default_only() -> Self {
        let schema = SchemaTree::new(
            SchemaNode::container(BOOK, vec![SchemaNode::default_content(verses())]).with_title("en", BOOK),
        );
        let version = Version::new(BOOK, "en", "Base", chapter(json!({"default": [["a", "b"], ["c"]]})));
        Self::new(vec![Index::new(BOOK, schema)], vec![version], vec![])
    }

    /// Content root
    pub fn simple() -> Self {
        let schema = SchemaTree::new(SchemaNode::content(BOOK, verses()).with_title("en", BOOK));
        let versions = vec![
            Version::new(BOOK, "en", "Base", chapter(json!([["a", "b"], ["c"]]))),
            Version::new(BOOK, "he", "Hebrew", chapter(json!([["alef"]]))),
        ];
        Self::new(vec![Index::new(BOOK, schema)], versions, vec![])
    }

    pub fn with_state(self, title: &str, flags: BTreeMap<String, Value>) -> Self {
        let versions = self.store.versions(title).unwrap();
        let state = VersionState::compute(title, flags, &versions);
        self.store.commit(WriteBatch::new().save_state(state)).unwrap();
        self
    }

    pub fn index(&self, title: &str) -> Index {
        self.store.load_index(title).unwrap()
    }

    pub fn content(&self, title: &str, version_title: &str) -> Value {
        let version = self
            .store
            .versions(title)
            .unwrap()
            .into_iter()
            .find(|v| v.version_title == version_title)
            .unwrap();
        serde_json::to_value(&version.chapter).unwrap()
    }

    pub fn versions(&self, title: &str) -> Vec<Version> {
        self.store.versions(title).unwrap()
    }

    pub fn links(&self) -> Vec<Link> {
        self.store.links(&LinkFilter::All).unwrap()
    }

    pub fn link_refs(&self) -> Vec<Vec<String>> {
        self.links().into_iter().map(|l| l.refs).collect()
    }
}
