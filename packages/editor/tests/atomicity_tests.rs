//! All-or-nothing behavior of structural edits

mod common;

use common::*;
use folio_editor::{EditorError, SchemaMutator};
use folio_schema::{ContentShape, Index, Link, NodePath, SchemaNode, Version, VersionState};
use folio_store::{
    CommitReceipt, DocumentStore, JsonFileStore, Library, LinkFilter, MemoryStore, StoreError, StoreResult,
    WriteBatch,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn appendix() -> SchemaNode {
    SchemaNode::content("appendix", ContentShape::integers(["Paragraph"])).with_title("en", "Appendix")
}

/// Store whose commits always lose the revision race
struct ConflictingStore {
    inner: MemoryStore,
}

impl DocumentStore for ConflictingStore {
    fn load_index(&self, title: &str) -> StoreResult<Index> {
        self.inner.load_index(title)
    }

    fn indexes(&self) -> StoreResult<Vec<Index>> {
        self.inner.indexes()
    }

    fn versions(&self, title: &str) -> StoreResult<Vec<Version>> {
        self.inner.versions(title)
    }

    fn links(&self, filter: &LinkFilter) -> StoreResult<Vec<Link>> {
        self.inner.links(filter)
    }

    fn version_state(&self, title: &str) -> StoreResult<Option<VersionState>> {
        self.inner.version_state(title)
    }

    fn commit(&self, _batch: WriteBatch) -> StoreResult<CommitReceipt> {
        Err(StoreError::Conflict {
            documents: vec![format!("version '{} [en] Base'", BOOK)],
        })
    }

    fn delete_index(&self, title: &str) -> StoreResult<()> {
        self.inner.delete_index(title)
    }
}

struct Gate {
    reached: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

/// Store that parks the first versions read until released
struct GatedStore {
    inner: MemoryStore,
    gate: parking_lot::Mutex<Option<Gate>>,
}

impl DocumentStore for GatedStore {
    fn load_index(&self, title: &str) -> StoreResult<Index> {
        self.inner.load_index(title)
    }

    fn indexes(&self) -> StoreResult<Vec<Index>> {
        self.inner.indexes()
    }

    fn versions(&self, title: &str) -> StoreResult<Vec<Version>> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.reached.send(());
            let _ = gate.release.recv();
        }
        self.inner.versions(title)
    }

    fn links(&self, filter: &LinkFilter) -> StoreResult<Vec<Link>> {
        self.inner.links(filter)
    }

    fn version_state(&self, title: &str) -> StoreResult<Option<VersionState>> {
        self.inner.version_state(title)
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        self.inner.commit(batch)
    }

    fn delete_index(&self, title: &str) -> StoreResult<()> {
        self.inner.delete_index(title)
    }
}

fn root_keys(store: &dyn DocumentStore) -> Vec<String> {
    let index = store.load_index(BOOK).unwrap();
    index.schema.root().children().iter().map(|n| n.key.clone()).collect()
}

#[test]
fn test_addressing_mismatch_writes_nothing() {
    let fixture = Fixture::complex();

    // a stray version whose "one" is a leaf instead of a mapping
    let mut stray = fixture.versions(BOOK).remove(1);
    stray.chapter = chapter(json!({"one": [["x"]], "two": {"body": []}}));
    fixture
        .store
        .commit(WriteBatch::new().override_dependencies().save_version(stray))
        .unwrap();

    let index_before = fixture.index(BOOK);
    let versions_before = fixture.versions(BOOK);
    let links_before = fixture.links();

    let err = fixture
        .mutator
        .insert_first_child(BOOK, NodePath::new(["one"]), SchemaNode::content("preface", verses()))
        .unwrap_err();
    assert!(matches!(err, EditorError::AddressingMismatch { .. }));
    assert!(!err.is_validation());

    assert_eq!(fixture.index(BOOK), index_before);
    assert_eq!(fixture.versions(BOOK), versions_before);
    assert_eq!(fixture.links(), links_before);
}

#[test]
fn test_move_onto_occupied_content_is_a_mismatch() {
    let fixture = Fixture::complex();

    // content for "two/intro" exists although the schema has no such node
    let mut base = fixture.versions(BOOK).remove(0);
    base.chapter = chapter(json!({
        "one": {"intro": [["a"]]},
        "two": {"body": [["d"]], "intro": [["stale"]]}
    }));
    fixture
        .store
        .commit(WriteBatch::new().override_dependencies().save_version(base))
        .unwrap();
    let versions_before = fixture.versions(BOOK);

    let err = fixture
        .mutator
        .change_parent(BOOK, NodePath::new(["one", "intro"]), NodePath::new(["two"]), 0)
        .unwrap_err();
    assert!(matches!(err, EditorError::AddressingMismatch { .. }));
    assert_eq!(fixture.versions(BOOK), versions_before);
}

#[test]
fn test_commit_conflict_is_partial_repair_failure() {
    let inner = MemoryStore::new();
    let mut batch = WriteBatch::new().save_index(Index::new(BOOK, complex_schema()));
    for version in complex_versions() {
        batch = batch.save_version(version);
    }
    inner.commit(batch).unwrap();

    let store = Arc::new(ConflictingStore { inner });
    let library = Arc::new(Library::new(store.clone()));
    let mutator = SchemaMutator::new(store.clone(), library.clone());
    let generation = library.generation();

    let err = mutator
        .insert_last_child(BOOK, NodePath::root(), appendix())
        .unwrap_err();
    match err {
        EditorError::PartialRepairFailure { failed, .. } => {
            assert_eq!(failed, vec!["version 'Sample [en] Base'".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    // no rebuild after a failed commit
    assert_eq!(library.generation(), generation);
    assert_eq!(store.load_index(BOOK).unwrap().schema, complex_schema());
}

#[test]
fn test_retry_skips_already_repaired_versions() {
    let fixture = Fixture::complex();

    // an earlier attempt already added the skeleton to the English version
    let mut base = fixture.versions(BOOK).remove(0);
    base.chapter
        .as_branch_mut()
        .unwrap()
        .insert("appendix".to_string(), chapter(json!([])));
    fixture
        .store
        .commit(WriteBatch::new().override_dependencies().save_version(base))
        .unwrap();
    let base_revision = fixture.versions(BOOK)[0].revision;

    let report = fixture
        .mutator
        .insert_last_child(BOOK, NodePath::root(), appendix())
        .unwrap();
    assert_eq!(report.versions_repaired, 1);
    assert_eq!(report.versions_skipped, 1);

    let versions = fixture.versions(BOOK);
    assert_eq!(versions[0].revision, base_revision);
    assert_eq!(fixture.content(BOOK, "Base")["appendix"], json!([]));
    assert_eq!(fixture.content(BOOK, "Hebrew")["appendix"], json!([]));
}

#[test]
fn test_concurrent_edits_on_one_book_all_land() {
    let fixture = Fixture::complex();
    let mutator = Arc::new(fixture.mutator);

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let mutator = mutator.clone();
            thread::spawn(move || {
                let node = SchemaNode::content(format!("extra{}", i), ContentShape::integers(["Paragraph"]));
                mutator.insert_last_child(BOOK, NodePath::root(), node)
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    let keys = root_keys(fixture.store.as_ref());
    assert_eq!(keys.len(), 6);
    assert_eq!(keys[..2], ["one", "two"]);
    for i in 0..4 {
        assert!(keys.contains(&format!("extra{}", i)));
    }
    for version in fixture.store.versions(BOOK).unwrap() {
        let content = version.chapter.as_branch().unwrap();
        for i in 0..4 {
            assert!(content.contains_key(&format!("extra{}", i)));
        }
    }
}

#[test]
fn test_insert_last_reads_position_under_the_lock() {
    let inner = MemoryStore::new();
    let mut batch = WriteBatch::new().save_index(Index::new(BOOK, complex_schema()));
    for version in complex_versions() {
        batch = batch.save_version(version);
    }
    inner.commit(batch).unwrap();

    let store = Arc::new(GatedStore {
        inner,
        gate: parking_lot::Mutex::new(None),
    });
    let library = Arc::new(Library::new(store.clone()));
    let mutator = Arc::new(SchemaMutator::new(store.clone(), library));

    let (reached_tx, reached_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    *store.gate.lock() = Some(Gate {
        reached: reached_tx,
        release: release_rx,
    });

    let first = {
        let mutator = mutator.clone();
        thread::spawn(move || mutator.insert_last_child(BOOK, NodePath::root(), SchemaNode::content("a", verses())))
    };
    // the first edit now holds the book lock
    reached_rx.recv().unwrap();

    let second = {
        let mutator = mutator.clone();
        thread::spawn(move || mutator.insert_last_child(BOOK, NodePath::root(), SchemaNode::content("b", verses())))
    };
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).unwrap();

    first.join().unwrap().unwrap();
    second.join().unwrap().unwrap();
    assert_eq!(root_keys(store.as_ref()), vec!["one", "two", "a", "b"]);
}

#[test]
fn test_file_store_persists_whole_edit() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("library.json");

    {
        let store = Arc::new(JsonFileStore::open(&path)?);
        let mut batch = WriteBatch::new().save_index(Index::new(BOOK, complex_schema()));
        for version in complex_versions() {
            batch = batch.save_version(version);
        }
        for link in sample_links() {
            batch = batch.save_link(link);
        }
        store.commit(batch)?;

        let library = Arc::new(Library::new(store.clone()));
        let mutator = SchemaMutator::new(store, library);
        mutator.remove_child(BOOK, NodePath::new(["one"]))?;
    }

    let reopened = JsonFileStore::open(&path)?;
    let index = reopened.load_index(BOOK)?;
    assert!(!index.schema.contains(&NodePath::new(["one"])));
    for version in reopened.versions(BOOK)? {
        assert!(!version.chapter.as_branch().unwrap().contains_key("one"));
    }
    assert_eq!(reopened.links(&LinkFilter::All)?.len(), 2);
    Ok(())
}
