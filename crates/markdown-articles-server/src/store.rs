use std::sync::{Arc, PoisonError, RwLock};

use markdown_articles::Document;

/// Single slot holding the document currently being served.
///
/// Readers clone the inner `Arc` and release the lock straight away; writers
/// hold it only for the pointer swap. The lock is never held across `.await`.
#[derive(Debug)]
pub struct DocumentStore {
    slot: RwLock<Arc<Document>>,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self {
            slot: RwLock::new(Arc::new(document)),
        }
    }

    pub fn current(&self) -> Arc<Document> {
        // A poisoned slot still holds a complete document; swaps cannot tear.
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Installs `document` and returns the one it replaced.
    pub fn replace(&self, document: Document) -> Arc<Document> {
        let next = Arc::new(document);
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
