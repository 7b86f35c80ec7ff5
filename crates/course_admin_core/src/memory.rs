//! crates/course_admin_core/src/memory.rs
//!
//! An in-process implementation of the `DocumentStore` port. It backs the
//! `DOCUMENT_STORE=memory` mode of the API and every test in the workspace,
//! so it also counts writes and can be told to fail writes on purpose.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ports::{DocumentStore, PortError, PortResult};
use crate::store::{new_document_id, CollectionPath, DocumentPath, Fields, StoredDocument};

#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<BTreeMap<CollectionPath, BTreeMap<String, Fields>>>,
    writes: AtomicUsize,
    failing_paths: Mutex<Vec<String>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful create/set/update/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Makes every subsequent write whose document path contains `fragment`
    /// fail with an unexpected error.
    pub fn fail_writes_containing(&self, fragment: &str) {
        self.failing_paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(fragment.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Number of documents directly inside `collection`.
    pub async fn count(&self, collection: &CollectionPath) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Total number of documents whose collection path starts with `prefix`.
    pub async fn count_under(&self, prefix: &str) -> usize {
        self.collections
            .read()
            .await
            .iter()
            .filter(|(path, _)| path.as_str().starts_with(prefix))
            .map(|(_, docs)| docs.len())
            .sum()
    }

    fn check_writable(&self, path: &DocumentPath) -> PortResult<()> {
        let rendered = path.to_string();
        let failing = self
            .failing_paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.iter().any(|fragment| rendered.contains(fragment.as_str())) {
            return Err(PortError::Unexpected(format!("write to {rendered} rejected")));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

/// Orders JSON scalars the way an ordered listing does: numbers numerically,
/// strings lexically, missing values last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => Ordering::Greater,
        (Some(_), Some(Value::Null) | None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> PortResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .map(|fields| StoredDocument {
                id: path.id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        order_by: Option<&str>,
    ) -> PortResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<StoredDocument> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| StoredDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(field) = order_by {
            docs.sort_by(|a, b| compare_values(a.fields.get(field), b.fields.get(field)));
        }
        Ok(docs)
    }

    async fn list_where(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> PortResult<Vec<StoredDocument>> {
        let docs = self.list(collection, None).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> PortResult<String> {
        let id = new_document_id();
        self.check_writable(&collection.doc(id.clone()))?;
        self.collections
            .write()
            .await
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), fields);
        self.record_write();
        Ok(id)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> PortResult<()> {
        self.check_writable(path)?;
        self.collections
            .write()
            .await
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), fields);
        self.record_write();
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> PortResult<()> {
        self.check_writable(path)?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(&path.collection)
            .and_then(|docs| docs.get_mut(&path.id))
            .ok_or_else(|| PortError::NotFound(format!("Document {path} not found")))?;
        existing.extend(fields);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> PortResult<()> {
        self.check_writable(path)?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&path.collection) {
            docs.remove(&path.id);
            if docs.is_empty() {
                collections.remove(&path.collection);
            }
        }
        self.record_write();
        Ok(())
    }
}
