//! Undo log for a multi-document write. Every successful write records how to
//! reverse it; a failed operation replays the log backwards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::DocumentStore;
use crate::store::{DocumentPath, Fields};

#[derive(Debug)]
enum Undo {
    Remove(DocumentPath),
    Restore(DocumentPath, Fields),
}

#[derive(Debug, Default)]
pub struct WriteJournal {
    entries: Mutex<Vec<Undo>>,
}

impl WriteJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a document that did not exist before.
    pub fn created(&self, path: DocumentPath) {
        self.push(Undo::Remove(path));
    }

    /// Records a document that was updated or deleted, with its prior content.
    pub fn overwritten(&self, path: DocumentPath, previous: Fields) {
        self.push(Undo::Restore(path, previous));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, undo: Undo) {
        self.lock().push(undo);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Undo>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reverts every recorded write, newest first. Keeps going past failures
    /// and returns how many undo steps could not be applied.
    pub async fn roll_back(&self, store: &dyn DocumentStore) -> usize {
        let entries = std::mem::take(&mut *self.lock());
        let mut failures = 0;
        for undo in entries.into_iter().rev() {
            let outcome = match &undo {
                Undo::Remove(path) => store.delete(path).await,
                Undo::Restore(path, fields) => store.set(path, fields.clone()).await,
            };
            if let Err(e) = outcome {
                failures += 1;
                warn!(?undo, error = %e, "Failed to undo write");
            }
        }
        debug!(failures, "Rollback finished");
        failures
    }
}

/// Which level of the tree a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Module,
    Section,
}

/// Write counters for one operation.
#[derive(Debug, Default)]
pub struct Tally {
    modules_created: AtomicUsize,
    modules_updated: AtomicUsize,
    modules_deleted: AtomicUsize,
    sections_created: AtomicUsize,
    sections_updated: AtomicUsize,
    sections_deleted: AtomicUsize,
}

impl Tally {
    pub fn created(&self, node: Node) {
        match node {
            Node::Module => &self.modules_created,
            Node::Section => &self.sections_created,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn updated(&self, node: Node) {
        match node {
            Node::Module => &self.modules_updated,
            Node::Section => &self.sections_updated,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn deleted(&self, node: Node) {
        match node {
            Node::Module => &self.modules_deleted,
            Node::Section => &self.sections_deleted,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            modules_created: self.modules_created.load(Ordering::Relaxed),
            modules_updated: self.modules_updated.load(Ordering::Relaxed),
            modules_deleted: self.modules_deleted.load(Ordering::Relaxed),
            sections_created: self.sections_created.load(Ordering::Relaxed),
            sections_updated: self.sections_updated.load(Ordering::Relaxed),
            sections_deleted: self.sections_deleted.load(Ordering::Relaxed),
        }
    }
}

/// What a reconciliation did to the module and section documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub modules_created: usize,
    pub modules_updated: usize,
    pub modules_deleted: usize,
    pub sections_created: usize,
    pub sections_updated: usize,
    pub sections_deleted: usize,
}
