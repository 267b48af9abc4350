use crate::clock::{Clock, SystemClock};
use crate::store::document::{compare_values, generate_document_id};
use crate::store::{Direction, Document, DocumentStore, DocumentWrite, Fields, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

type CollectionMap = DashMap<String, Fields>;

/// In-process document store.
///
/// Every write to a document runs under that document's DashMap shard lock,
/// which makes increments atomic per document.
pub struct MemoryStore {
    collections: DashMap<String, Arc<CollectionMap>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: DashMap::new(),
            clock,
        }
    }

    fn collection(&self, name: &str) -> Arc<CollectionMap> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone()
    }

    fn snapshot(&self, name: &str) -> Vec<Document> {
        self.collection(name)
            .iter()
            .map(|entry| Document::new(entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of documents currently in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collection(collection).len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .collection(collection)
            .get(id)
            .map(|entry| Document::new(id, entry.value().clone())))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        merge: bool,
    ) -> StoreResult<()> {
        let now = self.clock.now_millis();
        let docs = self.collection(collection);
        docs.entry(id.to_string())
            .and_modify(|fields| *fields = write.apply(Some(&*fields), merge, now))
            .or_insert_with(|| write.apply(None, merge, now));
        Ok(())
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> StoreResult<bool> {
        let now = self.clock.now_millis();
        match self.collection(collection).entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(write.apply(None, false, now));
                Ok(true)
            }
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
        }
    }

    async fn add_document(&self, collection: &str, write: DocumentWrite) -> StoreResult<String> {
        let now = self.clock.now_millis();
        let docs = self.collection(collection);
        loop {
            let id = generate_document_id();
            if let dashmap::mapref::entry::Entry::Vacant(slot) = docs.entry(id.clone()) {
                slot.insert(write.apply(None, false, now));
                return Ok(id);
            }
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool> {
        Ok(self.collection(collection).remove(id).is_some())
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .snapshot(collection)
            .into_iter()
            .filter(|doc| doc.get(field) == Some(value))
            .collect())
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .snapshot(collection)
            .into_iter()
            .filter(|doc| doc.get(order_field).is_some())
            .collect();

        docs.sort_by(|a, b| {
            let ord = compare_values(a.get(order_field), b.get(order_field));
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });

        if let Some(limit) = limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }
}
