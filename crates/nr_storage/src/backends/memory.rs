use async_trait::async_trait;
use nr_core::{
    CollectionPath, Document, DocumentData, DocumentPath, DocumentStore, Error, FieldTransform, OrderBy, Precondition,
    ReaderConfig, Result,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StorageBackend;

struct Entry {
    path: DocumentPath,
    data: DocumentData,
    version: u64,
}

impl Entry {
    fn to_document(&self) -> Document {
        Document { path: self.path.clone(), data: self.data.clone(), version: self.version }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, Entry>,
}

impl MemoryStore {
    pub fn get(&self, path: &DocumentPath) -> Option<Document> {
        self.documents.get(&path.to_string()).map(Entry::to_document)
    }

    fn version_of(&self, path: &DocumentPath) -> Option<u64> {
        self.documents.get(&path.to_string()).map(|e| e.version)
    }

    /// Writes `data` and returns the new version.
    pub fn put(&mut self, path: &DocumentPath, data: DocumentData, merge: bool) -> u64 {
        let entry = self.documents.entry(path.to_string()).or_insert_with(|| Entry {
            path: path.clone(),
            data: DocumentData::new(),
            version: 0,
        });
        if merge {
            entry.data.extend(data);
        } else {
            entry.data = data;
        }
        entry.version += 1;
        entry.version
    }

    pub fn transform(&mut self, path: &DocumentPath, transforms: &[FieldTransform]) -> u64 {
        let mut data = self.get(path).map(|d| d.data).unwrap_or_default();
        for t in transforms {
            t.apply(&mut data);
        }
        self.put(path, data, false)
    }

    pub fn remove(&mut self, path: &DocumentPath) {
        self.documents.remove(&path.to_string());
    }

    pub fn list(&self, collection: &CollectionPath) -> Vec<Document> {
        self.documents
            .values()
            .filter(|e| &e.path.parent() == collection)
            .map(Entry::to_document)
            .collect()
    }
}

/// Process-local document store. Stands in for the remote backend in tests and
/// in the `memory` storage mode.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    store: Arc<RwLock<MemoryStore>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails with [`Error::Storage`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Storage("document store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemoryDocumentStore {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(_config: &ReaderConfig) -> Result<Self> {
        Ok(MemoryDocumentStore::new())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.ensure_online()?;
        Ok(self.store.read().await.get(path))
    }

    async fn set_document(&self, path: &DocumentPath, data: DocumentData, merge: bool) -> Result<()> {
        self.ensure_online()?;
        self.store.write().await.put(path, data, merge);
        Ok(())
    }

    async fn set_document_if(&self, path: &DocumentPath, data: DocumentData, expected: Precondition) -> Result<u64> {
        self.ensure_online()?;
        let mut store = self.store.write().await;
        if !expected.holds(store.version_of(path)) {
            return Err(Error::Conflict(format!("{} changed since it was read", path)));
        }
        Ok(store.put(path, data, false))
    }

    async fn update_document(&self, path: &DocumentPath, transforms: Vec<FieldTransform>) -> Result<()> {
        self.ensure_online()?;
        self.store.write().await.transform(path, &transforms);
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<()> {
        self.ensure_online()?;
        self.store.write().await.remove(path);
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionPath, order_by: &OrderBy) -> Result<Vec<Document>> {
        self.ensure_online()?;
        let mut documents = self.store.read().await.list(collection);
        documents.sort_by(|a, b| order_by.compare(&a.data, &b.data));
        Ok(documents)
    }
}
