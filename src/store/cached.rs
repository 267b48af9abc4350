use crate::store::{Direction, Document, DocumentStore, DocumentWrite, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache over another document store.
///
/// Only point reads are cached; every write through this wrapper invalidates
/// the touched document. Writes from other processes become visible after
/// the TTL.
pub struct CachedStore {
    /// Underlying store implementation
    inner: Arc<dyn DocumentStore>,
    /// Point-read cache keyed by (collection, id). Only hits are kept, a
    /// document created elsewhere must be visible on the next read.
    read_cache: Cache<(String, String), Document>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, max_cache_entries: u64, ttl_secs: u64) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, read_cache }
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    async fn invalidate(&self, collection: &str, id: &str) {
        self.read_cache.invalidate(&Self::key(collection, id)).await;
    }
}

#[async_trait]
impl DocumentStore for CachedStore {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let key = Self::key(collection, id);
        if let Some(cached) = self.read_cache.get(&key).await {
            tracing::debug!(collection, id, "document cache hit");
            return Ok(Some(cached));
        }

        let result = self.inner.get_document(collection, id).await?;
        if let Some(doc) = &result {
            self.read_cache.insert(key, doc.clone()).await;
        }

        Ok(result)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        merge: bool,
    ) -> StoreResult<()> {
        let result = self.inner.set_document(collection, id, write, merge).await;
        // Invalidate even on failure, the write may have landed
        self.invalidate(collection, id).await;
        result
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> StoreResult<bool> {
        let result = self.inner.create_document(collection, id, write).await;
        self.invalidate(collection, id).await;
        result
    }

    async fn add_document(&self, collection: &str, write: DocumentWrite) -> StoreResult<String> {
        let id = self.inner.add_document(collection, write).await?;
        self.invalidate(collection, &id).await;
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = self.inner.delete_document(collection, id).await;
        self.invalidate(collection, id).await;
        result
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        self.inner.query_by_field(collection, field, value).await
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        self.inner
            .query_ordered(collection, order_field, direction, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_write_through_cache_invalidates() {
        let inner: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let cached = CachedStore::new(Arc::clone(&inner), 100, 300);

        assert!(cached.get_document("stats", "main").await.unwrap().is_none());

        cached
            .set_document("stats", "main", DocumentWrite::new().increment("totalPageViews", 1), true)
            .await
            .unwrap();

        let doc = cached.get_document("stats", "main").await.unwrap().unwrap();
        assert_eq!(doc.get_i64("totalPageViews"), Some(1));
    }

    #[tokio::test]
    async fn test_cached_read_hides_foreign_writes_until_ttl() {
        let inner: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let cached = CachedStore::new(Arc::clone(&inner), 100, 300);

        inner
            .set_document("stats", "main", DocumentWrite::new().set("totalPageViews", 1), false)
            .await
            .unwrap();
        let first = cached.get_document("stats", "main").await.unwrap().unwrap();
        assert_eq!(first.get_i64("totalPageViews"), Some(1));

        // Write bypassing the cache
        inner
            .set_document("stats", "main", DocumentWrite::new().set("totalPageViews", 2), false)
            .await
            .unwrap();
        let second = cached.get_document("stats", "main").await.unwrap().unwrap();
        assert_eq!(second.get_i64("totalPageViews"), Some(1));
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let inner: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let cached = CachedStore::new(Arc::clone(&inner), 100, 300);

        assert!(cached.get_document("stats", "main").await.unwrap().is_none());

        // Created by another process, not through this cache
        inner
            .set_document("stats", "main", DocumentWrite::new().set("totalPageViews", 7), false)
            .await
            .unwrap();

        let doc = cached.get_document("stats", "main").await.unwrap().unwrap();
        assert_eq!(doc.get_i64("totalPageViews"), Some(7));
    }

    #[tokio::test]
    async fn test_create_document_keeps_existing_and_invalidates() {
        let inner: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let cached = CachedStore::new(Arc::clone(&inner), 100, 300);

        let write = DocumentWrite::new().set("totalPageViews", 1);
        assert!(cached.create_document("stats", "main", write).await.unwrap());

        let again = DocumentWrite::new().set("totalPageViews", 99);
        assert!(!cached.create_document("stats", "main", again).await.unwrap());

        let doc = cached.get_document("stats", "main").await.unwrap().unwrap();
        assert_eq!(doc.get_i64("totalPageViews"), Some(1));
    }
}
