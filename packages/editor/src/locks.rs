use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Exclusive locks for structural edits, one per base book title.
///
/// A commentary is locked under its base title, so edits to a book and to
/// the commentaries derived from it are serialized.
#[derive(Debug, Default)]
pub struct BookLocks {
    books: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, base_title: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.books.read().get(base_title) {
            return lock.clone();
        }

        // another thread may have created it between the two locks
        self.books
            .write()
            .entry(base_title.to_string())
            .or_default()
            .clone()
    }

    /// Run `f` while holding the lock for `base_title`
    pub fn with_lock<T>(&self, base_title: &str, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(base_title);
        let _guard = handle.lock();
        tracing::debug!("Acquired book lock '{}'", base_title);
        f()
    }

    /// Whether an edit currently holds the lock for `base_title`
    pub fn is_locked(&self, base_title: &str) -> bool {
        self.books
            .read()
            .get(base_title)
            .is_some_and(|lock| lock.is_locked())
    }
}
